//! plugflash - LAN flashing and control for eWeLink DIY-mode smart plugs
//!
//! A UI-side [`relay::CommandRelay`] talks to a privileged
//! [`services::PrivilegedExecutor`] over a correlated message bus. The
//! executor performs every network operation: device API calls and firmware
//! downloads, which are hashed while streaming to disk and then served back to
//! the device over a local static HTTP server.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod models;
pub mod relay;
pub mod security;
pub mod server;
pub mod services;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use errors::*;
pub use models::*;

/// plugflash version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// plugflash application name
pub const APP_NAME: &str = "plugflash";
