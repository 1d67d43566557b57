//! Privileged side of the bus
//!
//! The executor is the only component that performs network I/O. It receives
//! envelopes from the UI side, runs them through an injected [`NetworkExecutor`],
//! and answers on the same channel with the same correlation id.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{PlugError, Result};
use crate::models::{Channel, DeviceApiRequest, Envelope, FirmwareArtifact, VerifyReply, VerifyRequest};
use crate::services::verifier::FirmwareVerifier;
use crate::transport::ExecutorEndpoint;

/// Network capabilities the executor needs
#[async_trait]
pub trait NetworkExecutor: Send + Sync {
    /// POST a JSON body and return the JSON response
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;

    /// Download and hash a firmware file into `target_dir`
    async fn fetch_firmware(&self, url: &str, target_dir: &Path) -> Result<FirmwareArtifact>;
}

/// [`NetworkExecutor`] backed by reqwest
pub struct HttpExecutor {
    client: reqwest::Client,
    verifier: FirmwareVerifier,
}

impl HttpExecutor {
    pub fn new(request_timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(5));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PlugError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            verifier: FirmwareVerifier::new()?,
        })
    }
}

#[async_trait]
impl NetworkExecutor for HttpExecutor {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    async fn fetch_firmware(&self, url: &str, target_dir: &Path) -> Result<FirmwareArtifact> {
        self.verifier.verify(url, target_dir).await
    }
}

/// Serves bus requests using a [`NetworkExecutor`]
pub struct PrivilegedExecutor {
    network: Arc<dyn NetworkExecutor>,
    static_dir: PathBuf,
    static_base_url: String,
}

impl PrivilegedExecutor {
    pub fn new(
        network: Arc<dyn NetworkExecutor>,
        static_dir: impl Into<PathBuf>,
        static_base_url: impl Into<String>,
    ) -> Self {
        Self {
            network,
            static_dir: static_dir.into(),
            static_base_url: static_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Spawn the executor loop; it ends when the UI side drops its transport
    pub fn spawn(self, endpoint: ExecutorEndpoint) -> tokio::task::JoinHandle<()> {
        tokio::spawn(Arc::new(self).run(endpoint))
    }

    /// Serve requests until the request stream closes
    ///
    /// Each request is handled on its own task; replies are matched by
    /// correlation id, so they may complete in any order.
    pub async fn run(self: Arc<Self>, endpoint: ExecutorEndpoint) {
        let ExecutorEndpoint {
            mut requests,
            replies,
        } = endpoint;
        info!("Privileged executor started");

        while let Some(request) = requests.recv().await {
            let executor = Arc::clone(&self);
            let replies = replies.clone();
            tokio::spawn(async move {
                let reply = executor.handle(request).await;
                if replies.send(reply).is_err() {
                    debug!("UI side closed before a reply could be delivered");
                }
            });
        }

        info!("Privileged executor stopped");
    }

    /// Produce the reply envelope for one request
    pub async fn handle(&self, request: Envelope) -> Envelope {
        let result = match request.channel {
            Channel::DeviceApi => self.handle_device_api(&request.payload).await,
            Channel::VerifyOtaUrl => self.handle_verify(&request.payload).await,
        };

        match result {
            Ok(payload) => request.reply(payload),
            Err(e) => {
                warn!(
                    "{} request {} failed: {}",
                    request.channel, request.correlation_id, e
                );
                request.reply(json!({ "error": e.to_wire() }))
            }
        }
    }

    async fn handle_device_api(&self, payload: &Value) -> Result<Value> {
        let request: DeviceApiRequest = serde_json::from_value(payload.clone())?;
        debug!(
            "POST {} for device {}",
            request.url, request.device_id
        );
        self.network.post_json(&request.url, &request.body).await
    }

    async fn handle_verify(&self, payload: &Value) -> Result<Value> {
        let request: VerifyRequest = serde_json::from_value(payload.clone())?;
        let fetch = self.network.fetch_firmware(&request.url, &self.static_dir);

        // Dropping the fetch on expiry discards the partially written temp file
        let artifact = match request.timeout_ms.map(Duration::from_millis) {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| PlugError::Timeout(limit))
                .and_then(|result| result),
            None => fetch.await,
        }
        .inspect_err(|e| error!("Verification of {} failed: {}", request.url, e))?;

        let reply = VerifyReply {
            download_url: format!("{}/{}", self.static_base_url, artifact.filename),
            size: artifact.size,
            sha256: artifact.sha256,
            filename: artifact.filename,
        };
        Ok(serde_json::to_value(reply)?)
    }
}
