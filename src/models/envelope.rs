//! Messages exchanged between the UI side and the privileged executor

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::errors::{PlugError, Result, WireError};

/// Logical topics on the message bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Device HTTP commands and their replies
    DeviceApi,
    /// Firmware verification requests and their replies
    VerifyOtaUrl,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::DeviceApi => f.write_str("device_api"),
            Channel::VerifyOtaUrl => f.write_str("verify_ota_url"),
        }
    }
}

/// One message on the bus; replies echo the request's correlation id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub channel: Channel,
    pub correlation_id: Uuid,
    pub payload: Value,
}

impl Envelope {
    pub fn new(channel: Channel, payload: Value) -> Self {
        Self {
            channel,
            correlation_id: Uuid::new_v4(),
            payload,
        }
    }

    /// Build the reply for this envelope on the same channel
    pub fn reply(&self, payload: Value) -> Self {
        Self {
            channel: self.channel,
            correlation_id: self.correlation_id,
            payload,
        }
    }
}

/// Payload of an outbound device command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceApiRequest {
    pub device_id: String,
    /// Absolute URL of the endpoint
    pub url: String,
    pub endpoint_path: String,
    /// `{deviceid, data}` POST body
    pub body: Value,
}

/// Interpret a device reply: `error == 0` yields `data`, anything else is an error
///
/// Some firmware versions return `data` as a string-encoded JSON document, which is
/// parsed here so callers always see structured data.
pub fn translate_device_reply(payload: Value) -> Result<Value> {
    let succeeded = payload
        .get("error")
        .and_then(Value::as_i64)
        .is_some_and(|code| code == 0);
    if !succeeded {
        return Err(PlugError::DeviceApi(payload));
    }

    match payload.get("data") {
        Some(Value::String(encoded)) => Ok(serde_json::from_str(encoded)?),
        Some(data) => Ok(data.clone()),
        None => Ok(Value::Null),
    }
}

/// Payload of a verification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub url: String,
    /// Caller's bound; the executor abandons the download (and its temp file) past it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Successful verification reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReply {
    pub size: u64,
    #[serde(rename = "sha256sum")]
    pub sha256: String,
    pub filename: String,
    pub download_url: String,
}

/// Failed verification reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: WireError,
}

/// Interpret a verification reply payload
pub fn translate_verify_reply(payload: Value) -> Result<VerifyReply> {
    if payload.get("error").is_some() {
        let reply: ErrorReply = serde_json::from_value(payload)?;
        return Err(reply.error.into());
    }
    Ok(serde_json::from_value(payload)?)
}
