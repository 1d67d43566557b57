//! Scan command implementation

use anyhow::Result;
use std::time::Duration;

use crate::config::AppConfig;
use crate::discovery::discover_devices;

pub async fn execute_scan_command(config: &AppConfig, timeout: Option<u64>) -> Result<()> {
    let timeout = timeout.unwrap_or(config.discovery.timeout_secs);
    println!("🔍 Discovering devices (timeout: {}s)...", timeout);

    let devices = discover_devices(
        &config.discovery.service_type,
        Duration::from_secs(timeout),
    )
    .await?;

    if devices.is_empty() {
        println!("📋 No devices found");
        println!();
        println!("💡 Troubleshooting:");
        println!("   • Ensure the device is in DIY mode");
        println!("   • Check that this machine is on the same network");
        return Ok(());
    }

    println!("📡 Found {} device(s):", devices.len());
    for device in &devices {
        println!(
            "  - {} at {}:{}",
            device.id,
            device.addresses.join(", "),
            device.port
        );
        let mut txt: Vec<_> = device.txt.iter().collect();
        txt.sort();
        for (key, value) in txt {
            println!("      {} = {}", key, value);
        }
    }
    Ok(())
}
