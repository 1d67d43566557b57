//! Message bus between the UI side and the privileged executor
//!
//! The relay only needs to push envelopes out; replies come back on a separate
//! inbound stream that the relay drains and dispatches by correlation id.

pub mod local;

pub use local::*;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::Envelope;

/// Outbound half of the bus as seen by the UI side
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one envelope; returning does not imply a reply will arrive
    async fn send(&self, envelope: Envelope) -> Result<()>;
}
