//! Typed per-device API on top of the command relay

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::CommandRelay;
use crate::errors::Result;
use crate::models::{Command, Device, SizePolicy, StartupMode, VerificationResult};

/// Control surface for one device
#[derive(Clone)]
pub struct DeviceClient {
    device: Device,
    relay: Arc<CommandRelay>,
    timeout: Option<Duration>,
}

impl DeviceClient {
    pub fn new(device: Device, relay: Arc<CommandRelay>) -> Self {
        Self {
            device,
            relay,
            timeout: None,
        }
    }

    /// Bound every command issued through this client
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub async fn execute(&self, command: Command) -> Result<Value> {
        self.relay.execute(&self.device, &command, self.timeout).await
    }

    pub async fn get_info(&self) -> Result<Value> {
        self.execute(Command::GetInfo).await
    }

    pub async fn switch(&self, on: bool) -> Result<Value> {
        self.execute(Command::Switch { on }).await
    }

    pub async fn set_startup(&self, mode: StartupMode) -> Result<Value> {
        self.execute(Command::SetStartup { mode }).await
    }

    pub async fn get_signal_strength(&self) -> Result<Value> {
        self.execute(Command::GetSignalStrength).await
    }

    pub async fn set_pulse(&self, on: bool, width_ms: i64) -> Result<Value> {
        self.execute(Command::SetPulse { on, width_ms }).await
    }

    pub async fn set_wifi(&self, ssid: &str, password: &str) -> Result<Value> {
        self.execute(Command::SetWifi {
            ssid: ssid.to_string(),
            password: password.to_string(),
        })
        .await
    }

    pub async fn set_ota_unlock(&self) -> Result<Value> {
        self.execute(Command::SetOtaUnlock).await
    }

    pub async fn flash_ota(&self, download_url: &str, sha256: &str) -> Result<Value> {
        self.execute(Command::FlashOta {
            download_url: download_url.to_string(),
            sha256: sha256.to_string(),
        })
        .await
    }

    /// Download and hash `url` through the executor, then apply the size policy
    pub async fn verify_ota_url(
        &self,
        url: &str,
        policy: &SizePolicy,
        timeout: Option<Duration>,
    ) -> Result<VerificationResult> {
        let reply = self.relay.verify_firmware(url, timeout).await?;
        Ok(policy.evaluate(reply))
    }
}
