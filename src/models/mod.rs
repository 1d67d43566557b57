//! Data models and types used throughout plugflash

pub mod command;
pub mod device;
pub mod envelope;
pub mod events;
pub mod verification;

// Re-export commonly used types
pub use command::*;
pub use device::*;
pub use envelope::*;
pub use events::*;
pub use verification::*;
