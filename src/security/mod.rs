//! Security modules for plugflash
//!
//! Input checks applied before the privileged side touches the network.

pub mod url_validator;

// Re-export commonly used security functions
pub use url_validator::UrlValidator;
