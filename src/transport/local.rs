//! In-process bus built on tokio channels

use async_trait::async_trait;
use log::trace;
use tokio::sync::mpsc;

use super::Transport;
use crate::errors::{PlugError, Result};
use crate::models::Envelope;

/// Transport that forwards envelopes to an executor in the same process
#[derive(Clone)]
pub struct LocalTransport {
    requests: mpsc::UnboundedSender<Envelope>,
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        trace!(
            "-> {} [{}]",
            envelope.channel,
            envelope.correlation_id
        );
        self.requests
            .send(envelope)
            .map_err(|_| PlugError::Transport("executor side of the bus is closed".to_string()))
    }
}

/// UI half: outbound transport plus the stream of replies
pub struct UiEndpoint {
    pub transport: LocalTransport,
    pub replies: mpsc::UnboundedReceiver<Envelope>,
}

/// Privileged half: stream of requests plus the reply sender
pub struct ExecutorEndpoint {
    pub requests: mpsc::UnboundedReceiver<Envelope>,
    pub replies: mpsc::UnboundedSender<Envelope>,
}

/// Create both halves of an in-process bus
pub fn local_bus() -> (UiEndpoint, ExecutorEndpoint) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();

    (
        UiEndpoint {
            transport: LocalTransport {
                requests: request_tx,
            },
            replies: reply_rx,
        },
        ExecutorEndpoint {
            requests: request_rx,
            replies: reply_tx,
        },
    )
}
