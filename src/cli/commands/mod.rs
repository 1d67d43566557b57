//! CLI command implementations

pub mod clean;
pub mod config;
pub mod device;
pub mod flash;
pub mod scan;
pub mod session;
pub mod verify;

use anyhow::Result;
use std::path::Path;

use crate::cli::args::Commands;
use crate::config::AppConfig;
use device::DeviceAction;

/// Execute a CLI command
pub async fn execute_command(command: Commands, config_path: &Path) -> Result<()> {
    if let Commands::Config { force } = command {
        return config::execute_config_command(config_path, force).await;
    }

    let app_config = AppConfig::load(config_path)?;

    match command {
        Commands::Scan { timeout } => scan::execute_scan_command(&app_config, timeout).await,
        Commands::Info { device } => {
            device::execute_device_command(app_config, device, DeviceAction::Info).await
        }
        Commands::Switch { device, state } => {
            device::execute_device_command(app_config, device, DeviceAction::Switch(state)).await
        }
        Commands::Startup { device, mode } => {
            device::execute_device_command(app_config, device, DeviceAction::Startup(mode)).await
        }
        Commands::Signal { device } => {
            device::execute_device_command(app_config, device, DeviceAction::Signal).await
        }
        Commands::Pulse {
            device,
            state,
            width,
        } => {
            device::execute_device_command(
                app_config,
                device,
                DeviceAction::Pulse {
                    state,
                    width_ms: width,
                },
            )
            .await
        }
        Commands::Wifi {
            device,
            ssid,
            password,
        } => {
            device::execute_device_command(app_config, device, DeviceAction::Wifi { ssid, password })
                .await
        }
        Commands::Unlock { device } => {
            device::execute_device_command(app_config, device, DeviceAction::Unlock).await
        }
        Commands::Verify { url } => verify::execute_verify_command(app_config, &url).await,
        Commands::Flash {
            device,
            url,
            serve_secs,
        } => flash::execute_flash_command(app_config, device, &url, serve_secs).await,
        Commands::Clean { file } => clean::execute_clean_command(&app_config, file.as_deref()).await,
        Commands::Config { .. } => Ok(()),
    }
}
