//! Firmware verification data

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_FIRMWARE_SIZE;
use crate::errors::PlugError;
use crate::models::envelope::VerifyReply;

/// A downloaded firmware file and the metadata computed while streaming it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareArtifact {
    /// Number of bytes written to disk
    pub size: u64,
    /// Lowercase hex SHA-256 of exactly those bytes
    pub sha256: String,
    /// Basename of the artifact inside the firmware directory
    pub filename: String,
}

/// Upper bound on firmware size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    pub max_size: u64,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_FIRMWARE_SIZE,
        }
    }
}

impl SizePolicy {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn allows(&self, size: u64) -> bool {
        size < self.max_size
    }

    /// Apply the policy to a verification reply
    ///
    /// Oversized artifacts still carry their size and digest so they can be shown.
    pub fn evaluate(&self, reply: VerifyReply) -> VerificationResult {
        let valid = self.allows(reply.size);
        let error = (!valid).then(|| {
            PlugError::SizeExceeded {
                size: reply.size,
                max: self.max_size,
            }
            .to_string()
        });

        VerificationResult {
            size: reply.size,
            sha256: reply.sha256,
            local_name: reply.filename,
            download_url: reply.download_url,
            max_size: self.max_size,
            valid,
            error,
        }
    }
}

/// Outcome of one verification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub size: u64,
    pub sha256: String,
    pub local_name: String,
    pub download_url: String,
    pub max_size: u64,
    pub valid: bool,
    /// Set when the size policy rejects the artifact
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(size: u64) -> VerifyReply {
        VerifyReply {
            size,
            sha256: "ab".repeat(32),
            filename: "firmware-x1.bin".to_string(),
            download_url: "http://192.168.1.5:4321/firmware-x1.bin".to_string(),
        }
    }

    #[test]
    fn test_small_artifact_is_valid() {
        let result = SizePolicy::default().evaluate(reply(507_999));
        assert!(result.valid);
        assert!(result.error.is_none());
        assert_eq!(result.local_name, "firmware-x1.bin");
    }

    #[test]
    fn test_artifact_at_limit_is_rejected() {
        let result = SizePolicy::default().evaluate(reply(508_000));
        assert!(!result.valid);
        let message = result.error.expect("Oversized artifact should carry an error");
        assert!(message.contains("508kb"));
    }

    #[test]
    fn test_oversized_artifact_keeps_metadata() {
        let result = SizePolicy::default().evaluate(reply(612_345));
        assert!(!result.valid);
        assert_eq!(result.size, 612_345);
        assert_eq!(result.sha256.len(), 64);
        let message = result.error.expect("Oversized artifact should carry an error");
        assert!(message.contains("612.345kb"));
        assert!(message.contains("508kb"));
    }
}
