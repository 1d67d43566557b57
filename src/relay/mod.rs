//! Command relay
//!
//! Every outbound envelope gets a fresh correlation id and an entry in the
//! pending-call table *before* it is sent. A background dispatcher drains the
//! reply stream and resolves the matching entry, so any number of calls may be
//! in flight on the same channel without stealing each other's replies.

pub mod device_client;

pub use device_client::DeviceClient;

use log::{debug, trace, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::{PlugError, Result};
use crate::models::{
    Channel, Command, Device, DeviceApiRequest, Envelope, VerifyReply, VerifyRequest,
    translate_device_reply, translate_verify_reply,
};
use crate::transport::Transport;

/// One in-flight call awaiting its reply
struct PendingCall {
    channel: Channel,
    created_at: Instant,
    reply: oneshot::Sender<Value>,
}

/// In-flight calls, plus whether the reply stream has ended
#[derive(Default)]
struct Pending {
    calls: HashMap<Uuid, PendingCall>,
    closed: bool,
}

type PendingTable = Arc<Mutex<Pending>>;

fn lock(table: &PendingTable) -> MutexGuard<'_, Pending> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes the pending entry when the call finishes, fails, times out or is dropped
struct PendingGuard {
    table: PendingTable,
    id: Uuid,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if lock(&self.table).calls.remove(&self.id).is_some() {
            trace!("Deregistered pending call {}", self.id);
        }
    }
}

/// Correlates outbound envelopes with their replies
pub struct CommandRelay {
    transport: Arc<dyn Transport>,
    pending: PendingTable,
    dispatcher: JoinHandle<()>,
}

impl CommandRelay {
    /// Create a relay and spawn the dispatcher that drains `replies`
    pub fn new(transport: Arc<dyn Transport>, replies: mpsc::UnboundedReceiver<Envelope>) -> Self {
        let pending: PendingTable = Arc::new(Mutex::new(Pending::default()));
        let dispatcher = tokio::spawn(Self::dispatch_loop(pending.clone(), replies));

        Self {
            transport,
            pending,
            dispatcher,
        }
    }

    async fn dispatch_loop(pending: PendingTable, mut replies: mpsc::UnboundedReceiver<Envelope>) {
        while let Some(envelope) = replies.recv().await {
            Self::dispatch(&pending, envelope);
        }

        // Dropping the senders wakes every waiter with a closed-channel error;
        // the flag makes later calls fail instead of registering
        let mut table = lock(&pending);
        table.closed = true;
        if !table.calls.is_empty() {
            warn!(
                "Reply stream closed with {} call(s) still pending",
                table.calls.len()
            );
        }
        table.calls.clear();
    }

    fn dispatch(pending: &PendingTable, envelope: Envelope) {
        let call = {
            let mut table = lock(pending);
            let sent_on = table.calls.get(&envelope.correlation_id).map(|call| call.channel);
            match sent_on {
                Some(channel) if channel == envelope.channel => {
                    table.calls.remove(&envelope.correlation_id)
                }
                Some(channel) => {
                    warn!(
                        "Reply {} arrived on {} but the call was sent on {}; ignoring",
                        envelope.correlation_id, envelope.channel, channel
                    );
                    None
                }
                None => {
                    warn!(
                        "Dropping reply {} on {}: no pending call",
                        envelope.correlation_id, envelope.channel
                    );
                    None
                }
            }
        };

        if let Some(call) = call {
            debug!(
                "Resolved {} call {} after {}ms",
                call.channel,
                envelope.correlation_id,
                call.created_at.elapsed().as_millis()
            );
            if call.reply.send(envelope.payload).is_err() {
                debug!(
                    "Caller for {} went away before the reply was delivered",
                    envelope.correlation_id
                );
            }
        }
    }

    /// Number of calls still awaiting a reply
    pub fn pending_calls(&self) -> usize {
        lock(&self.pending).calls.len()
    }

    /// Send `payload` on `channel` and wait for the single correlated reply
    pub async fn call(
        &self,
        channel: Channel,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let envelope = Envelope::new(channel, payload);
        let id = envelope.correlation_id;
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let mut table = lock(&self.pending);
            if table.closed {
                return Err(PlugError::Transport(format!(
                    "reply stream is closed, {} call not sent",
                    channel
                )));
            }
            table.calls.insert(
                id,
                PendingCall {
                    channel,
                    created_at: Instant::now(),
                    reply: reply_tx,
                },
            );
        }
        let _guard = PendingGuard {
            table: self.pending.clone(),
            id,
        };

        self.transport.send(envelope).await?;
        trace!("Sent {} call {}", channel, id);

        let reply = match timeout {
            Some(limit) => tokio::time::timeout(limit, reply_rx)
                .await
                .map_err(|_| PlugError::Timeout(limit))?,
            None => reply_rx.await,
        };

        reply.map_err(|_| {
            PlugError::Transport(format!(
                "reply stream closed before {} call {} was answered",
                channel, id
            ))
        })
    }

    /// Validate and send one device command, returning the device's `data`
    pub async fn execute(
        &self,
        device: &Device,
        command: &Command,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        command.validate()?;

        let endpoint_path = command.endpoint_path();
        let request = DeviceApiRequest {
            device_id: device.id().to_string(),
            url: format!("{}{}", device.base_url(), endpoint_path),
            endpoint_path: endpoint_path.to_string(),
            body: command.request_body(device.id()),
        };
        debug!("{} -> {}", command.name(), request.url);

        let payload = self
            .call(Channel::DeviceApi, serde_json::to_value(&request)?, timeout)
            .await?;
        translate_device_reply(payload)
    }

    /// Ask the executor to download and hash a firmware file
    pub async fn verify_firmware(&self, url: &str, timeout: Option<Duration>) -> Result<VerifyReply> {
        let request = VerifyRequest {
            url: url.to_string(),
            timeout_ms: timeout.map(|limit| limit.as_millis() as u64),
        };
        let payload = self
            .call(Channel::VerifyOtaUrl, serde_json::to_value(&request)?, timeout)
            .await?;
        translate_verify_reply(payload)
    }
}

impl Drop for CommandRelay {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}
