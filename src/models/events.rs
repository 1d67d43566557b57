//! Events emitted to the UI side

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::Result;
use crate::models::device::Device;

/// A device as seen by mDNS discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Full service instance name, stable across updates
    pub fullname: String,
    /// Device id from the TXT `id` record (or instance name)
    pub id: String,
    /// IPv4 addresses first, then IPv6, each sorted
    pub addresses: Vec<String>,
    pub port: u16,
    /// Raw TXT records
    pub txt: HashMap<String, String>,
}

impl DiscoveredDevice {
    /// Reference usable by the command relay
    pub fn to_device(&self) -> Result<Device> {
        Device::new(self.id.clone(), self.addresses.clone(), Some(self.port))
    }
}

/// Discovery lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    Added(DiscoveredDevice),
    Updated(DiscoveredDevice),
    /// Service instance name of the device that went away
    Removed(String),
}

/// Observable progress of a flash sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashStage {
    Unlocking,
    SendingUrl,
    Sent,
}

impl fmt::Display for FlashStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashStage::Unlocking => f.write_str("unlocking OTA"),
            FlashStage::SendingUrl => f.write_str("sending firmware URL"),
            FlashStage::Sent => f.write_str("firmware URL sent"),
        }
    }
}
