//! Wiring shared by every command that talks to a device
//!
//! A session owns the static artifact server, the privileged executor and the
//! command relay connecting the two over the in-process bus.

use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::cli::args::DeviceArgs;
use crate::config::AppConfig;
use crate::models::{Device, SizePolicy};
use crate::relay::{CommandRelay, DeviceClient};
use crate::server::StaticServer;
use crate::services::{HttpExecutor, PrivilegedExecutor};
use crate::transport::local_bus;

pub struct Session {
    pub config: AppConfig,
    server: StaticServer,
    relay: Arc<CommandRelay>,
    executor: JoinHandle<()>,
}

impl Session {
    pub async fn start(config: AppConfig) -> Result<Self> {
        let server = StaticServer::start(
            &config.static_dir,
            &config.static_bind_address,
            config.static_port,
        )
        .await?;

        let (ui, executor_side) = local_bus();
        let network = Arc::new(HttpExecutor::new(config.command_timeout())?);
        let executor =
            PrivilegedExecutor::new(network, &config.static_dir, server.base_url()).spawn(executor_side);
        let relay = Arc::new(CommandRelay::new(Arc::new(ui.transport), ui.replies));

        Ok(Self {
            config,
            server,
            relay,
            executor,
        })
    }

    pub fn policy(&self) -> SizePolicy {
        SizePolicy::new(self.config.max_firmware_size)
    }

    pub fn relay(&self) -> Arc<CommandRelay> {
        Arc::clone(&self.relay)
    }

    /// Client for the device named on the command line
    pub fn client(&self, args: &DeviceArgs) -> Result<DeviceClient> {
        let device = Device::new(
            args.id.clone(),
            args.addresses.clone(),
            Some(args.port.unwrap_or(self.config.default_device_port)),
        )?;
        Ok(DeviceClient::new(device, self.relay()).with_timeout(self.config.command_timeout()))
    }

    /// Close the bus, wait for the executor and stop the static server
    pub async fn shutdown(self) {
        let Session {
            server,
            relay,
            executor,
            ..
        } = self;

        // Dropping the last relay handle closes the transport, which ends the executor loop
        if Arc::strong_count(&relay) > 1 {
            debug!("Relay still referenced at shutdown, aborting executor");
            executor.abort();
        }
        drop(relay);
        match executor.await {
            Err(e) if !e.is_cancelled() => warn!("Executor task error: {}", e),
            _ => {}
        }
        server.shutdown().await;
    }
}
