//! Configuration management for plugflash

pub mod app_config;

pub use app_config::*;
