//! Custom error types for plugflash

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Main error type for plugflash operations
#[derive(Debug)]
pub enum PlugError {
    /// Caller-supplied parameters failed local validation
    InvalidArgument { field: String, message: String },
    /// Remote firmware URL answered with a non-success status
    Fetch { status_code: u16 },
    /// Network or stream failure while downloading firmware
    Transfer(String),
    /// Downloaded firmware is larger than the size policy allows
    SizeExceeded { size: u64, max: u64 },
    /// Device answered with a non-zero error code (raw reply payload)
    DeviceApi(serde_json::Value),
    /// No reply arrived within the caller's bound
    Timeout(Duration),
    /// Device stayed OTA-locked after an explicit unlock attempt
    UnlockFailed(String),
    /// Message bus failures (closed channel, malformed envelope)
    Transport(String),
    /// mDNS browse errors
    Discovery(String),
    /// Configuration related errors
    Config(String),
    /// General I/O errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
}

impl PlugError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        PlugError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convert into the shape carried over the transport
    pub fn to_wire(&self) -> WireError {
        let (kind, status_code) = match self {
            PlugError::InvalidArgument { .. } => (WireErrorKind::InvalidArgument, None),
            PlugError::Fetch { status_code } => (WireErrorKind::Fetch, Some(*status_code)),
            PlugError::Transfer(_) => (WireErrorKind::Transfer, None),
            PlugError::Timeout(_) => (WireErrorKind::Timeout, None),
            _ => (WireErrorKind::Other, None),
        };
        WireError {
            kind,
            message: self.to_string(),
            status_code,
        }
    }
}

impl fmt::Display for PlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlugError::InvalidArgument { field, message } => {
                write!(f, "Invalid argument '{}': {}", field, message)
            }
            PlugError::Fetch { status_code } => write!(
                f,
                "Received non-success status code \"{}\" while fetching file",
                status_code
            ),
            PlugError::Transfer(msg) => write!(f, "Transfer error: {}", msg),
            PlugError::SizeExceeded { size, max } => write!(
                f,
                "The file size ({}kb) must be less than the max file size ({}kb)",
                *size as f64 / 1000.0,
                *max as f64 / 1000.0
            ),
            PlugError::DeviceApi(payload) => write!(f, "Device API error: {}", payload),
            PlugError::Timeout(after) => {
                write!(f, "No reply received within {}ms", after.as_millis())
            }
            PlugError::UnlockFailed(device_id) => write!(
                f,
                "Device {} is still OTA locked. Make sure the device is on a network connected to the internet",
                device_id
            ),
            PlugError::Transport(msg) => write!(f, "Transport error: {}", msg),
            PlugError::Discovery(msg) => write!(f, "Discovery error: {}", msg),
            PlugError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PlugError::Io(err) => write!(f, "I/O error: {}", err),
            PlugError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for PlugError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlugError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlugError {
    fn from(err: std::io::Error) -> Self {
        PlugError::Io(err)
    }
}

impl From<serde_json::Error> for PlugError {
    fn from(err: serde_json::Error) -> Self {
        PlugError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PlugError {
    fn from(err: toml::de::Error) -> Self {
        PlugError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PlugError {
    fn from(err: toml::ser::Error) -> Self {
        PlugError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for PlugError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if !status.is_success() => PlugError::Fetch {
                status_code: status.as_u16(),
            },
            _ => PlugError::Transfer(err.to_string()),
        }
    }
}

/// Error category carried in reply envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireErrorKind {
    InvalidArgument,
    Fetch,
    Transfer,
    Timeout,
    Other,
}

/// Serialized form of a [`PlugError`] sent back by the privileged executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireError {
    pub kind: WireErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl From<WireError> for PlugError {
    fn from(wire: WireError) -> Self {
        match (wire.kind, wire.status_code) {
            (WireErrorKind::Fetch, Some(status_code)) => PlugError::Fetch { status_code },
            (WireErrorKind::Transfer, _) => PlugError::Transfer(wire.message),
            (WireErrorKind::InvalidArgument, _) => {
                PlugError::invalid_argument("url", wire.message)
            }
            _ => PlugError::Transport(wire.message),
        }
    }
}

/// Result type alias for plugflash operations
pub type Result<T> = std::result::Result<T, PlugError>;
