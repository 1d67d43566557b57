//! Command line argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "plugflash")]
#[command(about = "🔌 Flash and control eWeLink DIY-mode smart plugs over the LAN")]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// How to reach a device
#[derive(Args, Clone, Debug)]
pub struct DeviceArgs {
    /// Device id (as advertised in the mDNS TXT record)
    #[arg(long)]
    pub id: String,

    /// Device address; may be repeated, the first one is used
    #[arg(long = "address", required = true)]
    pub addresses: Vec<String>,

    /// Device API port (defaults to the configured port)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Discover devices on the local network via mDNS
    Scan {
        /// Browse duration in seconds (defaults to the configured timeout)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Show device information
    Info {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Turn the relay on or off
    Switch {
        #[command(flatten)]
        device: DeviceArgs,
        /// on | off
        state: String,
    },
    /// Set the power-on state
    Startup {
        #[command(flatten)]
        device: DeviceArgs,
        /// on | off | stay
        mode: String,
    },
    /// Show the WiFi signal strength
    Signal {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Configure inching (auto-off) mode
    Pulse {
        #[command(flatten)]
        device: DeviceArgs,
        /// on | off
        state: String,
        /// Pulse width in milliseconds (500..=36000000, multiple of 500)
        #[arg(long, default_value = "500")]
        width: i64,
    },
    /// Set WiFi credentials
    Wifi {
        #[command(flatten)]
        device: DeviceArgs,
        #[arg(long)]
        ssid: String,
        #[arg(long)]
        password: String,
    },
    /// Unlock OTA updates on the device
    Unlock {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Download a firmware image and report its size and SHA-256
    Verify {
        /// Firmware URL
        url: String,
    },
    /// Verify a firmware image and flash it to a device over the air
    Flash {
        #[command(flatten)]
        device: DeviceArgs,
        /// Firmware URL
        url: String,
        /// Keep serving the artifact this many seconds so the device can fetch it
        #[arg(long, default_value = "120")]
        serve_secs: u64,
    },
    /// Remove downloaded firmware artifacts
    Clean {
        /// Remove only this artifact
        #[arg(long)]
        file: Option<String>,
    },
    /// Write the default configuration file
    Config {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
