//! Flash command implementation

use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;

use super::session::Session;
use super::verify::{print_verification, verify_with};
use crate::cli::args::DeviceArgs;
use crate::config::AppConfig;
use crate::services::OtaFlashService;

pub async fn execute_flash_command(
    config: AppConfig,
    device: DeviceArgs,
    url: &str,
    serve_secs: u64,
) -> Result<()> {
    let session = Session::start(config).await?;
    let result = flash_with(&session, &device, url, serve_secs).await;
    session.shutdown().await;
    result
}

async fn flash_with(session: &Session, device: &DeviceArgs, url: &str, serve_secs: u64) -> Result<()> {
    let client = session.client(device)?;

    let verification = verify_with(session, url).await?;
    print_verification(&verification);

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(stage) = progress_rx.recv().await {
            println!("⚡ {}", stage);
        }
    });

    println!("📡 Flashing {} ({})...", client.device().id(), client.device().base_url());
    let result = OtaFlashService::new(client)
        .flash(&verification, Some(progress_tx))
        .await;
    let _ = printer.await;
    result?;

    println!(
        "⏳ Serving {} for {}s while the device downloads it...",
        verification.local_name, serve_secs
    );
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(serve_secs)) => {}
        _ = tokio::signal::ctrl_c() => println!("🛑 Interrupted"),
    }
    println!("✅ Flash request sent to {}", device.id);
    Ok(())
}
