//! Application configuration management

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::Result;

/// Largest firmware image the devices accept over OTA (bytes)
pub const DEFAULT_MAX_FIRMWARE_SIZE: u64 = 508_000;

/// Port the DIY-mode HTTP API listens on
pub const DEFAULT_DEVICE_PORT: u16 = 8081;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory verified firmware artifacts are written to and served from
    pub static_dir: PathBuf,
    /// Bind address of the static artifact server
    pub static_bind_address: String,
    /// Port of the static artifact server (0 picks a free port)
    pub static_port: u16,
    /// Firmware images must be strictly smaller than this (bytes)
    pub max_firmware_size: u64,
    /// Timeout for a single device command in seconds
    pub command_timeout_secs: u64,
    /// Timeout for a firmware verification round trip in seconds
    pub verify_timeout_secs: u64,
    /// Port assumed for devices that do not advertise one
    pub default_device_port: u16,
    /// Discovery configuration
    pub discovery: DiscoveryConfig,
}

/// mDNS discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Service type browsed for devices
    pub service_type: String,
    /// How long the CLI `scan` command listens for events
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            static_bind_address: "0.0.0.0".to_string(),
            static_port: 0,
            max_firmware_size: DEFAULT_MAX_FIRMWARE_SIZE,
            command_timeout_secs: 10,
            verify_timeout_secs: 120,
            default_device_port: DEFAULT_DEVICE_PORT,
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            service_type: "_ewelink._tcp.local.".to_string(),
            timeout_secs: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write configuration as pretty TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.command_timeout_secs)
    }

    pub fn verify_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.verify_timeout_secs)
    }
}

/// A zero timeout disables the bound
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn default_static_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plugflash")
        .join("static")
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plugflash")
        .join("plugflash.toml")
}
