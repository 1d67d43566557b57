//! Config command implementation

use anyhow::Result;
use std::path::Path;

use crate::config::AppConfig;

/// Generate a default configuration file
pub async fn execute_config_command(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        println!(
            "⚠️  {} already exists, use --force to overwrite",
            config_path.display()
        );
        return Ok(());
    }

    println!("⚙️  Generating default configuration...");
    AppConfig::default().save(config_path)?;

    println!(
        "✅ Generated default configuration file: {}",
        config_path.display()
    );
    println!("ℹ️  You can edit this file to customize plugflash settings.");
    Ok(())
}
