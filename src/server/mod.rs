//! Static artifact server
//!
//! Devices cannot reach the source firmware URL (or should not be trusted to
//! fetch an unbounded file), so verified artifacts are served from a local HTTP
//! listener and the device is handed that URL instead.

pub mod middleware;
pub mod static_server;

pub use static_server::*;
