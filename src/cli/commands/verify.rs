//! Verify command implementation

use anyhow::Result;

use super::session::Session;
use crate::config::AppConfig;
use crate::models::VerificationResult;

pub async fn execute_verify_command(config: AppConfig, url: &str) -> Result<()> {
    let session = Session::start(config).await?;
    let result = verify_with(&session, url).await;
    session.shutdown().await;

    let verification = result?;
    print_verification(&verification);
    Ok(())
}

pub(super) async fn verify_with(session: &Session, url: &str) -> Result<VerificationResult> {
    println!("🔎 Verifying {}...", url);
    let reply = session
        .relay()
        .verify_firmware(url, session.config.verify_timeout())
        .await?;
    Ok(session.policy().evaluate(reply))
}

pub(super) fn print_verification(verification: &VerificationResult) {
    println!("📦 Artifact:  {}", verification.local_name);
    println!("📏 Size:      {} bytes", verification.size);
    println!("🔐 SHA-256:   {}", verification.sha256);
    println!("🌐 Served at: {}", verification.download_url);
    match &verification.error {
        None => println!("✅ Firmware is valid"),
        Some(error) => println!("❌ {}", error),
    }
}
