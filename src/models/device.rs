//! Device references

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DEVICE_PORT;
use crate::errors::{PlugError, Result};

/// A DIY-mode device found on the local network
///
/// The device is referenced, not owned: plugflash only needs enough to build
/// the base URL of its HTTP control API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDevice")]
pub struct Device {
    id: String,
    addresses: Vec<String>,
    port: u16,
}

/// Unchecked wire form; deserialization goes through [`Device::new`]
#[derive(Deserialize)]
struct RawDevice {
    id: String,
    addresses: Vec<String>,
    #[serde(default)]
    port: Option<u16>,
}

impl TryFrom<RawDevice> for Device {
    type Error = PlugError;

    fn try_from(raw: RawDevice) -> Result<Self> {
        Device::new(raw.id, raw.addresses, raw.port)
    }
}

impl Device {
    /// Build a device reference, rejecting a blank id or an empty address list
    pub fn new(id: impl Into<String>, addresses: Vec<String>, port: Option<u16>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PlugError::invalid_argument(
                "id",
                "Device id must not be blank",
            ));
        }
        if addresses.is_empty() {
            return Err(PlugError::invalid_argument(
                "addresses",
                "Device must have an address",
            ));
        }

        Ok(Self {
            id,
            addresses,
            port: port.unwrap_or(DEFAULT_DEVICE_PORT),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// First advertised address
    pub fn primary_address(&self) -> &str {
        self.addresses.first().map(String::as_str).unwrap_or_default()
    }

    /// `http://<primary address>:<port>`
    pub fn base_url(&self) -> String {
        let address = self.primary_address();
        if address.contains(':') && !address.starts_with('[') {
            format!("http://[{}]:{}", address, self.port)
        } else {
            format!("http://{}:{}", address, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_id_is_rejected() {
        let err = Device::new("  ", vec!["192.168.1.20".to_string()], None).unwrap_err();
        match err {
            PlugError::InvalidArgument { field, .. } => assert_eq!(field, "id"),
            other => panic!("Expected InvalidArgument, got: {:?}", other),
        }
    }

    #[test]
    fn test_missing_addresses_are_rejected() {
        let err = Device::new("1000abcdef", Vec::new(), None).unwrap_err();
        assert!(matches!(err, PlugError::InvalidArgument { ref field, .. } if field == "addresses"));
    }

    #[test]
    fn test_base_url_uses_primary_address_and_default_port() {
        let device = Device::new(
            "1000abcdef",
            vec!["192.168.1.20".to_string(), "10.0.0.4".to_string()],
            None,
        )
        .expect("Valid device");
        assert_eq!(device.base_url(), "http://192.168.1.20:8081");
    }

    #[test]
    fn test_deserialize_validates_like_new() {
        assert!(serde_json::from_str::<Device>(r#"{"id":"","addresses":[]}"#).is_err());
        assert!(
            serde_json::from_str::<Device>(r#"{"id":"1000abcdef","addresses":[],"port":8081}"#)
                .is_err()
        );

        let device: Device =
            serde_json::from_str(r#"{"id":"1000abcdef","addresses":["192.168.1.20"]}"#)
                .expect("Valid device should deserialize");
        assert_eq!(device.port(), 8081);
        assert_eq!(device.base_url(), "http://192.168.1.20:8081");

        let round_trip: Device = serde_json::from_value(
            serde_json::to_value(&device).expect("Device should serialize"),
        )
        .expect("Serialized device should deserialize");
        assert_eq!(round_trip, device);
    }

    #[test]
    fn test_ipv6_address_is_bracketed() {
        let device =
            Device::new("1000abcdef", vec!["fe80::1".to_string()], Some(9000)).expect("Valid device");
        assert_eq!(device.base_url(), "http://[fe80::1]:9000");
    }
}
