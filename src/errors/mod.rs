//! Error types shared across plugflash

pub mod types;

pub use types::*;
