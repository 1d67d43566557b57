//! Services module containing the firmware pipeline
//!
//! Verification and artifact handling run on the privileged side; the OTA flash
//! sequence runs on the UI side on top of the command relay.

pub mod artifacts;
pub mod executor;
pub mod ota_flash;
pub mod verifier;

pub use artifacts::ArtifactStore;
pub use executor::{HttpExecutor, NetworkExecutor, PrivilegedExecutor};
pub use ota_flash::OtaFlashService;
pub use verifier::FirmwareVerifier;
