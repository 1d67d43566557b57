//! Warp middleware for the artifact server

pub mod logging;
