//! Firmware verifier tests against a real HTTP server

use plugflash::errors::PlugError;
use plugflash::models::SizePolicy;
use plugflash::relay::CommandRelay;
use plugflash::server::StaticServer;
use plugflash::services::{FirmwareVerifier, HttpExecutor, PrivilegedExecutor};
use plugflash::transport::local_bus;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use warp::Filter;

const FOOBAR_SHA256: &str = "c3ab8ff13720e8ad9047dd39466b3c8974e592c2fa383d4a3960714caef0c4f2";

/// Serve `/fw.bin` ("foobar"), `/big.bin` (600 kB) and `/slow.bin` (three
/// 2-byte chunks, 150ms apart); everything else is a 404
fn spawn_firmware_host() -> SocketAddr {
    let small = warp::path("fw.bin").map(|| "foobar");
    let big = warp::path("big.bin").map(|| vec![0u8; 600_000]);
    let slow = warp::path("slow.bin").map(|| {
        let chunks = futures_util::stream::unfold(0u8, |sent| async move {
            if sent == 3 {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
            Some((Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"fo")), sent + 1))
        });
        warp::reply::Response::new(warp::hyper::Body::wrap_stream(chunks))
    });
    let routes = warp::get().and(small.or(big).or(slow));
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn bin_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.file_name().to_string_lossy().to_string())
                .filter(|name| name.ends_with(".bin"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_verify_reports_size_and_digest() {
    let host = spawn_firmware_host();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let verifier = FirmwareVerifier::new().expect("Client should build");

    let artifact = verifier
        .verify(&format!("http://{}/fw.bin", host), temp_dir.path())
        .await
        .expect("Verification should succeed");

    assert_eq!(artifact.size, 6);
    assert_eq!(artifact.sha256, FOOBAR_SHA256);
    assert!(artifact.filename.ends_with(".bin"));
    let stored = std::fs::read(temp_dir.path().join(&artifact.filename)).expect("Artifact on disk");
    assert_eq!(stored, b"foobar");
}

#[tokio::test]
async fn test_not_found_leaves_no_artifact() {
    let host = spawn_firmware_host();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let verifier = FirmwareVerifier::new().expect("Client should build");

    let result = verifier
        .verify(&format!("http://{}/missing.bin", host), temp_dir.path())
        .await;

    assert!(matches!(result, Err(PlugError::Fetch { status_code: 404 })));
    assert!(bin_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_unreachable_host_is_a_transfer_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let verifier = FirmwareVerifier::new().expect("Client should build");

    // Port 9 (discard) on loopback is not listening in test environments
    let result = verifier
        .verify("http://127.0.0.1:9/fw.bin", temp_dir.path())
        .await;

    assert!(matches!(result, Err(PlugError::Transfer(_))));
    assert!(bin_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_repeated_verification_creates_distinct_files() {
    let host = spawn_firmware_host();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let verifier = FirmwareVerifier::new().expect("Client should build");
    let url = format!("http://{}/fw.bin", host);

    let first = verifier.verify(&url, temp_dir.path()).await.expect("First");
    let second = verifier.verify(&url, temp_dir.path()).await.expect("Second");

    assert_ne!(first.filename, second.filename);
    assert_eq!(first.sha256, second.sha256);
    assert_eq!(bin_files(temp_dir.path()).len(), 2);
}

#[tokio::test]
async fn test_timed_out_verification_leaves_no_artifact() {
    let host = spawn_firmware_host();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let (ui, executor_side) = local_bus();
    let network = Arc::new(HttpExecutor::new(None).expect("Client should build"));
    PrivilegedExecutor::new(network, temp_dir.path(), "http://127.0.0.1:1").spawn(executor_side);
    let relay = CommandRelay::new(Arc::new(ui.transport), ui.replies);

    let result = relay
        .verify_firmware(
            &format!("http://{}/slow.bin", host),
            Some(Duration::from_millis(100)),
        )
        .await;
    assert!(matches!(result, Err(PlugError::Timeout(_))));

    // Well past the point the slow download would have completed
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(bin_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_end_to_end_verification_is_served_back() {
    let host = spawn_firmware_host();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let server = StaticServer::start(temp_dir.path(), "127.0.0.1", 0)
        .await
        .expect("Static server should start");
    let (ui, executor_side) = local_bus();
    let network = Arc::new(HttpExecutor::new(None).expect("Client should build"));
    PrivilegedExecutor::new(network, temp_dir.path(), server.base_url()).spawn(executor_side);
    let relay = CommandRelay::new(Arc::new(ui.transport), ui.replies);

    let reply = relay
        .verify_firmware(&format!("http://{}/fw.bin", host), None)
        .await
        .expect("Verification should succeed");
    let result = SizePolicy::default().evaluate(reply);

    assert!(result.valid);
    assert_eq!(result.sha256, FOOBAR_SHA256);
    assert!(result.download_url.starts_with(server.base_url()));

    let served = reqwest::get(&result.download_url)
        .await
        .expect("Download should succeed")
        .bytes()
        .await
        .expect("Body should be readable");
    assert_eq!(&served[..], b"foobar");

    let oversized = relay
        .verify_firmware(&format!("http://{}/big.bin", host), None)
        .await
        .expect("Verification should succeed");
    let result = SizePolicy::default().evaluate(oversized);
    assert!(!result.valid);
    assert_eq!(result.size, 600_000);
    assert_eq!(
        result.error.as_deref(),
        Some("The file size (600kb) must be less than the max file size (508kb)")
    );

    let missing = relay
        .verify_firmware(&format!("http://{}/missing.bin", host), None)
        .await;
    assert!(matches!(missing, Err(PlugError::Fetch { status_code: 404 })));

    drop(relay);
    server.shutdown().await;
}
