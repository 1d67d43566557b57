//! Firmware download and verification
//!
//! The response body is streamed straight to a temp file in the firmware
//! directory. Each chunk is written, counted and hashed before the next one is
//! pulled, so size and digest always describe exactly the bytes on disk.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::errors::{PlugError, Result};
use crate::models::FirmwareArtifact;
use crate::security::UrlValidator;

/// Suffix of every downloaded artifact
pub const ARTIFACT_SUFFIX: &str = ".bin";
const ARTIFACT_PREFIX: &str = "firmware-";

/// Downloads firmware candidates and computes their size and SHA-256
#[derive(Clone)]
pub struct FirmwareVerifier {
    client: reqwest::Client,
}

impl FirmwareVerifier {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PlugError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `url` into a fresh `.bin` file inside `target_dir`
    ///
    /// Non-success statuses fail before anything is written. Every call creates
    /// its own file, even for a URL that was verified before.
    pub async fn verify(&self, url: &str, target_dir: &Path) -> Result<FirmwareArtifact> {
        let url = UrlValidator::validate_firmware_url(url)?;
        info!("Fetching firmware from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PlugError::Transfer(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Firmware fetch from {} returned {}", url, status);
            return Err(PlugError::Fetch {
                status_code: status.as_u16(),
            });
        }

        let artifact = store_stream(response.bytes_stream(), target_dir).await?;
        info!(
            "Stored {} ({:.1} KB, sha256 {})",
            artifact.filename,
            artifact.size as f64 / 1024.0,
            artifact.sha256
        );
        Ok(artifact)
    }
}

/// Write a chunk stream to a new temp file in `target_dir` while hashing it
///
/// The temp file is deleted if the stream fails or the future is dropped before
/// completion; it is kept only once the last chunk has been flushed.
pub async fn store_stream<S, E>(stream: S, target_dir: &Path) -> Result<FirmwareArtifact>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    tokio::fs::create_dir_all(target_dir).await?;

    let temp = tempfile::Builder::new()
        .prefix(ARTIFACT_PREFIX)
        .suffix(ARTIFACT_SUFFIX)
        .tempfile_in(target_dir)?;
    let mut file = tokio::fs::File::from_std(temp.as_file().try_clone()?);
    debug!("Streaming firmware into {}", temp.path().display());

    let mut hasher = Sha256::new();
    let mut size: u64 = 0;
    let mut stream = std::pin::pin!(stream);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| PlugError::Transfer(e.to_string()))?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
        hasher.update(&chunk);
    }

    file.flush().await?;
    drop(file);

    let (_, path) = temp.keep().map_err(|e| PlugError::Io(e.error))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| PlugError::Transfer("temp file has no name".to_string()))?;

    Ok(FirmwareArtifact {
        size,
        sha256: format!("{:x}", hasher.finalize()),
        filename,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tempfile::TempDir;

    fn chunks(parts: &[&'static [u8]]) -> Vec<std::result::Result<Bytes, std::io::Error>> {
        parts.iter().map(|part| Ok(Bytes::from_static(part))).collect()
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_chunked_stream_hashes_whole_payload() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let artifact = store_stream(stream::iter(chunks(&[b"foo", b"", b"bar"])), temp_dir.path())
            .await
            .expect("Stream should be stored");

        assert_eq!(artifact.size, 6);
        assert_eq!(
            artifact.sha256,
            "c3ab8ff13720e8ad9047dd39466b3c8974e592c2fa383d4a3960714caef0c4f2"
        );
        assert!(artifact.filename.ends_with(".bin"));

        let on_disk = std::fs::read(temp_dir.path().join(&artifact.filename))
            .expect("Artifact should exist");
        assert_eq!(on_disk, b"foobar");
    }

    #[tokio::test]
    async fn test_stream_error_removes_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let items: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ];

        let result = store_stream(stream::iter(items), temp_dir.path()).await;

        assert!(matches!(result, Err(PlugError::Transfer(_))));
        assert_eq!(entries(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_target_directory_is_created() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = temp_dir.path().join("static").join("firmware");

        let artifact = store_stream(stream::iter(chunks(&[b"x"])), &target)
            .await
            .expect("Stream should be stored");
        assert!(target.join(artifact.filename).exists());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_fetching() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let verifier = FirmwareVerifier::new().expect("Client should build");

        let result = verifier.verify("ftp://example.com/fw.bin", temp_dir.path()).await;
        assert!(matches!(result, Err(PlugError::InvalidArgument { .. })));
        assert_eq!(entries(temp_dir.path()), 0);
    }
}
