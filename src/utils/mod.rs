//! Utility modules for plugflash

pub mod logging;
