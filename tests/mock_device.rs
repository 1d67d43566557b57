//! Mock device framework
//!
//! Simulates a DIY-mode plug behind the privileged executor, plus a scripted
//! transport for driving the relay directly, so the whole command path can be
//! tested without real hardware.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use plugflash::errors::{PlugError, Result};
use plugflash::models::{Envelope, FirmwareArtifact};
use plugflash::relay::CommandRelay;
use plugflash::services::verifier::store_stream;
use plugflash::services::{NetworkExecutor, PrivilegedExecutor};
use plugflash::transport::{Transport, local_bus};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Simulated state of the plug
#[derive(Debug, Clone)]
pub struct MockDeviceState {
    pub switch: String,
    pub startup: String,
    pub ota_unlocked: Option<bool>,
    /// Whether `/zeroconf/ota_unlock` actually unlocks the device
    pub unlock_succeeds: bool,
    pub signal_strength: i64,
    /// Return `data` as a string-encoded JSON document, like older firmware
    pub string_encoded_data: bool,
}

impl Default for MockDeviceState {
    fn default() -> Self {
        Self {
            switch: "off".to_string(),
            startup: "off".to_string(),
            ota_unlocked: Some(true),
            unlock_succeeds: true,
            signal_strength: -67,
            string_encoded_data: false,
        }
    }
}

/// Error injection for the mock device
#[derive(Debug, Clone, Default)]
pub struct MockErrorInjection {
    /// Endpoint path answered with a non-zero `error` code
    pub failing_endpoint: Option<(String, i64)>,
    /// HTTP status returned for firmware downloads
    pub fetch_status: Option<u16>,
    /// Delay before every device reply
    pub reply_delay: Duration,
}

/// Fake network executor: a plug plus a firmware host
pub struct MockDevice {
    pub device_id: String,
    state: Mutex<MockDeviceState>,
    errors: Mutex<MockErrorInjection>,
    calls: Mutex<Vec<(String, Value)>>,
    firmware: Vec<u8>,
}

impl MockDevice {
    pub fn new(device_id: &str) -> Self {
        Self::with_state(device_id, MockDeviceState::default())
    }

    pub fn with_state(device_id: &str, state: MockDeviceState) -> Self {
        Self {
            device_id: device_id.to_string(),
            state: Mutex::new(state),
            errors: Mutex::new(MockErrorInjection::default()),
            calls: Mutex::new(Vec::new()),
            firmware: b"foobar".to_vec(),
        }
    }

    pub fn with_firmware(mut self, firmware: Vec<u8>) -> Self {
        self.firmware = firmware;
        self
    }

    pub fn inject(&self, errors: MockErrorInjection) {
        *self.errors.lock().unwrap() = errors;
    }

    pub fn state(&self) -> MockDeviceState {
        self.state.lock().unwrap().clone()
    }

    /// Endpoint paths in the order they were called
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|called| *called == path).count()
    }

    pub fn body_of_last(&self, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(called, _)| called == path)
            .map(|(_, body)| body.clone())
    }

    fn respond(&self, path: &str, body: &Value) -> Value {
        if let Some((failing, code)) = &self.errors.lock().unwrap().failing_endpoint {
            if failing == path {
                return json!({ "seq": 1, "error": code });
            }
        }

        let mut state = self.state.lock().unwrap();
        let data = &body["data"];
        let reply_data = match path {
            "/zeroconf/info" => json!({
                "switch": state.switch,
                "startup": state.startup,
                "otaUnlock": state.ota_unlocked,
                "deviceid": self.device_id,
            }),
            "/zeroconf/switch" => {
                if let Some(value) = data["switch"].as_str() {
                    state.switch = value.to_string();
                }
                json!({})
            }
            "/zeroconf/startup" => {
                if let Some(value) = data["startup"].as_str() {
                    state.startup = value.to_string();
                }
                json!({})
            }
            "/zeroconf/signal_strength" => json!({ "signalStrength": state.signal_strength }),
            "/zeroconf/ota_unlock" => {
                if state.unlock_succeeds {
                    state.ota_unlocked = Some(true);
                }
                json!({})
            }
            _ => json!({}),
        };

        let reply_data = if state.string_encoded_data {
            Value::String(reply_data.to_string())
        } else {
            reply_data
        };
        json!({ "seq": 1, "error": 0, "data": reply_data })
    }
}

#[async_trait]
impl NetworkExecutor for MockDevice {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let path = url::Url::parse(url)
            .map_err(|e| PlugError::Transfer(e.to_string()))?
            .path()
            .to_string();
        self.calls
            .lock()
            .unwrap()
            .push((path.clone(), body.clone()));

        let delay = self.errors.lock().unwrap().reply_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.respond(&path, body))
    }

    async fn fetch_firmware(&self, _url: &str, target_dir: &Path) -> Result<FirmwareArtifact> {
        if let Some(status_code) = self.errors.lock().unwrap().fetch_status {
            return Err(PlugError::Fetch { status_code });
        }

        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = self
            .firmware
            .chunks(3)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        store_stream(stream::iter(chunks), target_dir).await
    }
}

/// Relay wired to a real privileged executor backed by `device`
pub fn relay_with_executor(device: Arc<MockDevice>, static_dir: &Path) -> Arc<CommandRelay> {
    let (ui, executor_side) = local_bus();
    PrivilegedExecutor::new(device, static_dir, "http://192.168.1.5:4000").spawn(executor_side);
    Arc::new(CommandRelay::new(Arc::new(ui.transport), ui.replies))
}

/// Transport that hands every envelope to the test instead of an executor
pub struct ScriptedTransport {
    sent: mpsc::UnboundedSender<Envelope>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        self.sent
            .send(envelope)
            .map_err(|_| PlugError::Transport("test harness closed".to_string()))
    }
}

/// Relay whose requests surface on the returned receiver and whose replies are
/// injected through the returned sender
pub fn scripted_relay() -> (
    Arc<CommandRelay>,
    mpsc::UnboundedReceiver<Envelope>,
    mpsc::UnboundedSender<Envelope>,
) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    let relay = CommandRelay::new(Arc::new(ScriptedTransport { sent: sent_tx }), reply_rx);
    (Arc::new(relay), sent_rx, reply_tx)
}
