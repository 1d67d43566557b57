use log::{debug, info, warn};
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::{PlugError, Result};
use crate::models::{DiscoveredDevice, DiscoveryEvent};

/// Instance names look like `eWeLink_1000abcdef._ewelink._tcp.local.`
const INSTANCE_PREFIX: &str = "eWeLink_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// Restartable mDNS browse
///
/// Starting a scan while one is running stops the old browse first, so at most
/// one subscription is ever live.
pub struct DeviceScanner {
    daemon: ServiceDaemon,
    service_type: String,
    forwarder: Option<JoinHandle<()>>,
}

impl DeviceScanner {
    pub fn new(service_type: impl Into<String>) -> Result<Self> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| PlugError::Discovery(format!("Failed to create mDNS daemon: {}", e)))?;

        Ok(Self {
            daemon,
            service_type: service_type.into(),
            forwarder: None,
        })
    }

    pub fn state(&self) -> ScanState {
        match &self.forwarder {
            Some(task) if !task.is_finished() => ScanState::Scanning,
            _ => ScanState::Idle,
        }
    }

    /// Start (or restart) browsing, sending events to `events`
    pub fn start(&mut self, events: mpsc::UnboundedSender<DiscoveryEvent>) -> Result<()> {
        self.stop();

        let receiver = self
            .daemon
            .browse(&self.service_type)
            .map_err(|e| PlugError::Discovery(format!("Failed to start mDNS browse: {}", e)))?;
        info!("Browsing for {} services", self.service_type);

        self.forwarder = Some(tokio::spawn(async move {
            let mut known = HashSet::new();
            while let Ok(event) = receiver.recv_async().await {
                if !forward_event(event, &mut known, &events) {
                    break;
                }
            }
            debug!("mDNS event forwarding finished");
        }));
        Ok(())
    }

    /// Stop the current browse, if any
    pub fn stop(&mut self) {
        if let Some(task) = self.forwarder.take() {
            task.abort();
            if let Err(e) = self.daemon.stop_browse(&self.service_type) {
                debug!("Failed to stop mDNS browse: {}", e);
            }
            info!("Stopped browsing for {} services", self.service_type);
        }
    }

    /// Stop browsing and shut the mDNS daemon down
    pub fn shutdown(mut self) -> Result<()> {
        self.stop();
        self.daemon
            .shutdown()
            .map_err(|e| PlugError::Discovery(format!("Failed to shutdown mDNS daemon: {}", e)))?;
        Ok(())
    }
}

impl Drop for DeviceScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Translate one mDNS event; returns false once nobody is listening
fn forward_event(
    event: ServiceEvent,
    known: &mut HashSet<String>,
    events: &mpsc::UnboundedSender<DiscoveryEvent>,
) -> bool {
    let translated = match event {
        ServiceEvent::ServiceResolved(info) => match device_from_service(&info) {
            Some(device) if known.insert(device.fullname.clone()) => {
                Some(DiscoveryEvent::Added(device))
            }
            Some(device) => Some(DiscoveryEvent::Updated(device)),
            None => {
                warn!("Ignoring {}: no usable address or id", info.get_fullname());
                None
            }
        },
        ServiceEvent::ServiceRemoved(_, fullname) => known
            .remove(&fullname)
            .then_some(DiscoveryEvent::Removed(fullname)),
        ServiceEvent::SearchStopped(_) => return false,
        _ => None,
    };

    match translated {
        Some(event) => events.send(event).is_ok(),
        None => true,
    }
}

fn device_from_service(info: &ServiceInfo) -> Option<DiscoveredDevice> {
    let mut txt = HashMap::new();
    for property in info.get_properties().iter() {
        let property_string = format!("{}", property);
        if let Some((key, value)) = property_string.split_once('=') {
            txt.insert(key.to_string(), value.to_string());
        }
    }

    build_device(
        info.get_fullname(),
        info.get_addresses().iter().copied().collect(),
        info.get_port(),
        txt,
    )
}

/// Assemble a device from resolved service data
pub fn build_device(
    fullname: &str,
    mut addresses: Vec<IpAddr>,
    port: u16,
    txt: HashMap<String, String>,
) -> Option<DiscoveredDevice> {
    if addresses.is_empty() {
        return None;
    }
    // IPv4 first; the primary address is the one commands are sent to
    addresses.sort_by_key(|ip| (ip.is_ipv6(), *ip));

    let id = txt
        .get("id")
        .filter(|id| !id.trim().is_empty())
        .cloned()
        .or_else(|| {
            let instance = fullname.split('.').next()?;
            let id = instance.strip_prefix(INSTANCE_PREFIX).unwrap_or(instance);
            (!id.is_empty()).then(|| id.to_string())
        })?;

    Some(DiscoveredDevice {
        fullname: fullname.to_string(),
        id,
        addresses: addresses.iter().map(IpAddr::to_string).collect(),
        port,
        txt,
    })
}

/// Browse for `timeout` and return every device that was resolved
pub async fn discover_devices(service_type: &str, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
    let mut scanner = DeviceScanner::new(service_type)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    scanner.start(tx)?;

    let mut devices: HashMap<String, DiscoveredDevice> = HashMap::new();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(DiscoveryEvent::Added(device) | DiscoveryEvent::Updated(device))) => {
                devices.insert(device.fullname.clone(), device);
            }
            Ok(Some(DiscoveryEvent::Removed(fullname))) => {
                devices.remove(&fullname);
            }
            Ok(None) | Err(_) => break,
        }
    }

    if let Err(e) = scanner.shutdown() {
        debug!("{}", e);
    }

    let mut devices: Vec<DiscoveredDevice> = devices.into_values().collect();
    devices.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(devices)
}
