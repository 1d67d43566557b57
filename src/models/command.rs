//! Device control commands and their HTTP mapping

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

use crate::errors::{PlugError, Result};

pub const PULSE_WIDTH_MIN: i64 = 500;
pub const PULSE_WIDTH_MAX: i64 = 36_000_000;
pub const PULSE_WIDTH_STEP: i64 = 500;

/// Relay state after the device powers up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupMode {
    Off,
    On,
    Stay,
}

impl StartupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartupMode::Off => "off",
            StartupMode::On => "on",
            StartupMode::Stay => "stay",
        }
    }
}

impl fmt::Display for StartupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartupMode {
    type Err = PlugError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "off" => Ok(StartupMode::Off),
            "on" => Ok(StartupMode::On),
            "stay" => Ok(StartupMode::Stay),
            other => Err(PlugError::invalid_argument(
                "startup",
                format!(
                    "Invalid power on state value \"{}\". Must be one of on, off, stay",
                    other
                ),
            )),
        }
    }
}

/// Parse an `on`/`off` toggle as used by the switch and pulse endpoints
pub fn parse_on_off(field: &str, value: &str) -> Result<bool> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(PlugError::invalid_argument(
            field,
            format!("Invalid {} value \"{}\". Must be one of on, off", field, other),
        )),
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A device control intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetInfo,
    Switch { on: bool },
    SetStartup { mode: StartupMode },
    GetSignalStrength,
    SetPulse { on: bool, width_ms: i64 },
    SetWifi { ssid: String, password: String },
    SetOtaUnlock,
    FlashOta { download_url: String, sha256: String },
}

impl Command {
    /// Endpoint path on the device HTTP API
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Command::GetInfo => "/zeroconf/info",
            Command::Switch { .. } => "/zeroconf/switch",
            Command::SetStartup { .. } => "/zeroconf/startup",
            Command::GetSignalStrength => "/zeroconf/signal_strength",
            Command::SetPulse { .. } => "/zeroconf/pulse",
            Command::SetWifi { .. } => "/zeroconf/wifi",
            Command::SetOtaUnlock => "/zeroconf/ota_unlock",
            Command::FlashOta { .. } => "/zeroconf/ota_flash",
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetInfo => "get_info",
            Command::Switch { .. } => "switch",
            Command::SetStartup { .. } => "set_startup",
            Command::GetSignalStrength => "get_signal_strength",
            Command::SetPulse { .. } => "set_pulse",
            Command::SetWifi { .. } => "set_wifi",
            Command::SetOtaUnlock => "set_ota_unlock",
            Command::FlashOta { .. } => "flash_ota",
        }
    }

    /// Check parameters locally; nothing is sent when this fails
    pub fn validate(&self) -> Result<()> {
        match self {
            Command::SetPulse { width_ms, .. } => {
                let width = *width_ms;
                if !(PULSE_WIDTH_MIN..=PULSE_WIDTH_MAX).contains(&width)
                    || width % PULSE_WIDTH_STEP != 0
                {
                    return Err(PlugError::invalid_argument(
                        "pulseWidth",
                        format!(
                            "Invalid pulseWidth value \"{}\". Must be a multiple of {} between {} and {}",
                            width, PULSE_WIDTH_STEP, PULSE_WIDTH_MIN, PULSE_WIDTH_MAX
                        ),
                    ));
                }
            }
            Command::SetWifi { ssid, password } => {
                if is_blank(ssid) {
                    return Err(PlugError::invalid_argument(
                        "ssid",
                        format!("Invalid ssid value \"{}\". Must not be blank", ssid),
                    ));
                }
                if is_blank(password) {
                    return Err(PlugError::invalid_argument(
                        "password",
                        "Invalid password value. Must not be blank",
                    ));
                }
            }
            Command::FlashOta {
                download_url,
                sha256,
            } => {
                if is_blank(download_url) {
                    return Err(PlugError::invalid_argument(
                        "downloadUrl",
                        "Download URL must not be blank",
                    ));
                }
                if is_blank(sha256) {
                    return Err(PlugError::invalid_argument(
                        "sha256sum",
                        "SHA-256 checksum must not be blank",
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The `data` object of the request body
    pub fn data(&self) -> Value {
        match self {
            Command::GetInfo | Command::GetSignalStrength | Command::SetOtaUnlock => json!({}),
            Command::Switch { on } => json!({ "switch": on_off(*on) }),
            Command::SetStartup { mode } => json!({ "startup": mode.as_str() }),
            Command::SetPulse { on, width_ms } => json!({
                "pulse": on_off(*on),
                "pulseWidth": width_ms,
            }),
            Command::SetWifi { ssid, password } => json!({
                "ssid": ssid,
                "password": password,
            }),
            Command::FlashOta {
                download_url,
                sha256,
            } => json!({
                "downloadUrl": download_url,
                "sha256sum": sha256,
            }),
        }
    }

    /// Full POST body `{deviceid, data}`
    pub fn request_body(&self, device_id: &str) -> Value {
        json!({
            "deviceid": device_id,
            "data": self.data(),
        })
    }
}
