//! Device control commands: info, switch, startup, signal, pulse, wifi, unlock

use anyhow::Result;
use serde_json::Value;

use super::session::Session;
use crate::cli::args::DeviceArgs;
use crate::config::AppConfig;
use crate::models::{Command, StartupMode, parse_on_off};

/// Build the device command described by a CLI subcommand
pub fn command_for(action: &DeviceAction) -> Result<Command> {
    let command = match action {
        DeviceAction::Info => Command::GetInfo,
        DeviceAction::Switch(state) => Command::Switch {
            on: parse_on_off("switch", state)?,
        },
        DeviceAction::Startup(mode) => Command::SetStartup {
            mode: mode.parse::<StartupMode>()?,
        },
        DeviceAction::Signal => Command::GetSignalStrength,
        DeviceAction::Pulse { state, width_ms } => Command::SetPulse {
            on: parse_on_off("pulse", state)?,
            width_ms: *width_ms,
        },
        DeviceAction::Wifi { ssid, password } => Command::SetWifi {
            ssid: ssid.clone(),
            password: password.clone(),
        },
        DeviceAction::Unlock => Command::SetOtaUnlock,
    };
    command.validate()?;
    Ok(command)
}

#[derive(Debug, Clone)]
pub enum DeviceAction {
    Info,
    Switch(String),
    Startup(String),
    Signal,
    Pulse { state: String, width_ms: i64 },
    Wifi { ssid: String, password: String },
    Unlock,
}

pub async fn execute_device_command(
    config: AppConfig,
    device: DeviceArgs,
    action: DeviceAction,
) -> Result<()> {
    // Reject bad arguments before anything is started
    let command = command_for(&action)?;

    let session = Session::start(config).await?;
    let client = session.client(&device)?;

    println!(
        "📡 {} -> {} ({})",
        command.name(),
        client.device().id(),
        client.device().base_url()
    );
    let result = client.execute(command).await;
    drop(client);
    session.shutdown().await;

    let data = result?;
    print_reply(&data);
    Ok(())
}

fn print_reply(data: &Value) {
    match data {
        Value::Null => println!("✅ Done"),
        Value::Object(map) if map.is_empty() => println!("✅ Done"),
        other => match serde_json::to_string_pretty(other) {
            Ok(pretty) => println!("✅ {}", pretty),
            Err(_) => println!("✅ {}", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_rejected_before_start() {
        assert!(command_for(&DeviceAction::Switch("maybe".to_string())).is_err());
        assert!(command_for(&DeviceAction::Startup("sometimes".to_string())).is_err());
    }

    #[test]
    fn test_pulse_width_is_validated() {
        let err = command_for(&DeviceAction::Pulse {
            state: "on".to_string(),
            width_ms: 750,
        });
        assert!(err.is_err());

        let ok = command_for(&DeviceAction::Pulse {
            state: "on".to_string(),
            width_ms: 1500,
        })
        .expect("Valid pulse");
        assert_eq!(
            ok,
            Command::SetPulse {
                on: true,
                width_ms: 1500
            }
        );
    }
}
