use log::{debug, info, warn};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::Filter;

use crate::errors::{PlugError, Result};

/// Plain-HTTP file server over the firmware directory
pub struct StaticServer {
    local_addr: SocketAddr,
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl StaticServer {
    /// Bind on `bind_address:port` (port 0 picks a free one) and start serving `dir`
    pub async fn start(dir: &Path, bind_address: &str, port: u16) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let bind_addr: SocketAddr = format!("{}:{}", bind_address, port)
            .parse()
            .map_err(|e| PlugError::Config(format!("Invalid bind address: {}", e)))?;

        let routes = warp::get()
            .and(warp::fs::dir(dir.to_path_buf()))
            .with(super::middleware::logging::with_request_logging());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (local_addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|e| {
                PlugError::Config(format!("Failed to bind static server on {}: {}", bind_addr, e))
            })?;
        let task = tokio::spawn(server);

        let base_url = format!(
            "http://{}",
            SocketAddr::new(advertised_ip(local_addr.ip()), local_addr.port())
        );
        info!(
            "Serving {} on {} (advertised as {})",
            dir.display(),
            local_addr,
            base_url
        );

        Ok(Self {
            local_addr,
            base_url,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URL prefix devices use to fetch artifacts
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop accepting connections and wait for the server task
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Static server task error: {}", e);
        }
        debug!("Static server on {} shut down", self.local_addr);
    }
}

/// Address devices on the LAN can reach us at
///
/// A wildcard bind is replaced by the first non-loopback IPv4 interface.
fn advertised_ip(bound: IpAddr) -> IpAddr {
    if !bound.is_unspecified() {
        return bound;
    }

    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .map(|iface| iface.addr.ip())
            .find(IpAddr::is_ipv4)
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        Err(e) => {
            warn!("Failed to get network interfaces: {}", e);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}
