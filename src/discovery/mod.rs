//! mDNS device discovery
//!
//! DIY-mode devices announce themselves as `_ewelink._tcp` services. The scanner
//! owns a single browse at a time and turns mDNS events into
//! [`DiscoveryEvent`](crate::models::DiscoveryEvent)s.

pub mod scanner;

pub use scanner::*;
