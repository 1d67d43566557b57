//! OTA flash sequencing
//!
//! Flashing is a strict sequence of awaited device commands: check the OTA
//! lock, unlock once if needed, confirm, then hand the device the URL of the
//! verified artifact. Nothing here retries.

use log::{info, warn};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::{PlugError, Result};
use crate::models::{FlashStage, VerificationResult};
use crate::relay::DeviceClient;

/// Drives a verified firmware artifact onto one device
pub struct OtaFlashService {
    client: DeviceClient,
}

fn ota_unlocked(info: &Value) -> Option<bool> {
    info.get("otaUnlock").and_then(Value::as_bool)
}

impl OtaFlashService {
    pub fn new(client: DeviceClient) -> Self {
        Self { client }
    }

    fn report(progress_tx: Option<&mpsc::UnboundedSender<FlashStage>>, stage: FlashStage) {
        info!("Flash stage: {}", stage);
        if let Some(tx) = progress_tx {
            let _ = tx.send(stage);
        }
    }

    /// Flash `verification` onto the device, returning the terminal stage
    pub async fn flash(
        &self,
        verification: &VerificationResult,
        progress_tx: Option<mpsc::UnboundedSender<FlashStage>>,
    ) -> Result<FlashStage> {
        if !verification.valid {
            return Err(PlugError::SizeExceeded {
                size: verification.size,
                max: verification.max_size,
            });
        }

        let device_id = self.client.device().id().to_string();
        let progress_tx = progress_tx.as_ref();

        let info = self.client.get_info().await?;
        if ota_unlocked(&info) == Some(false) {
            Self::report(progress_tx, FlashStage::Unlocking);
            self.client.set_ota_unlock().await?;

            let info = self.client.get_info().await?;
            if ota_unlocked(&info) != Some(true) {
                warn!("Device {} is still OTA locked after unlock", device_id);
                return Err(PlugError::UnlockFailed(device_id));
            }
        }

        Self::report(progress_tx, FlashStage::SendingUrl);
        self.client
            .flash_ota(&verification.download_url, &verification.sha256)
            .await?;

        Self::report(progress_tx, FlashStage::Sent);
        info!(
            "Device {} is fetching {}",
            device_id, verification.download_url
        );
        Ok(FlashStage::Sent)
    }
}
