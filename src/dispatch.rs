//! Bounded off-loop delivery of command replies.
//!
//! The event loop hands reply batches to [`ReplyDispatcher::try_dispatch`],
//! which never waits: a full queue drops the batch. A single dispatcher task
//! drains the queue, and each batch is sent on its own task while holding a
//! semaphore permit, so a hung send blocks one permit and nothing else.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::transport::{OutboundMessage, Transport};

/// Dispatcher limits.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Reply batches waiting for a worker before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Reply batches being sent at the same time.
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_concurrent_sends: default_max_concurrent_sends(),
        }
    }
}

fn default_queue_capacity() -> usize {
    64
}
fn default_max_concurrent_sends() -> usize {
    8
}

/// Why a batch was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchRejected {
    /// The queue is at capacity.
    Full,
    /// The dispatcher task is gone.
    Closed,
}

/// Handle for queueing reply batches.
pub struct ReplyDispatcher {
    queue: mpsc::Sender<Vec<OutboundMessage>>,
    worker: JoinHandle<()>,
}

impl ReplyDispatcher {
    /// Spawn the dispatcher task. Must be called inside a tokio runtime.
    pub fn spawn(transport: Arc<dyn Transport>, config: &DispatchConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let permits = Arc::new(Semaphore::new(config.max_concurrent_sends.max(1)));
        let worker = tokio::spawn(drain(rx, transport, permits));
        Self { queue: tx, worker }
    }

    /// Queue a batch without waiting. Empty batches are accepted and ignored.
    pub fn try_dispatch(&self, batch: Vec<OutboundMessage>) -> Result<(), DispatchRejected> {
        if batch.is_empty() {
            return Ok(());
        }
        self.queue.try_send(batch).map_err(|e| match e {
            mpsc::error::TrySendError::Full(dropped) => {
                warn!(messages = dropped.len(), "reply queue full, dropping reply");
                DispatchRejected::Full
            }
            mpsc::error::TrySendError::Closed(_) => DispatchRejected::Closed,
        })
    }
}

impl Drop for ReplyDispatcher {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn drain(
    mut rx: mpsc::Receiver<Vec<OutboundMessage>>,
    transport: Arc<dyn Transport>,
    permits: Arc<Semaphore>,
) {
    while let Some(batch) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let transport = Arc::clone(&transport);
        tokio::spawn(async move {
            let _permit = permit;
            send_batch(transport.as_ref(), batch).await;
        });
    }
    debug!("reply dispatcher stopped");
}

/// Send messages in order, stopping at the first failure.
async fn send_batch(transport: &dyn Transport, batch: Vec<OutboundMessage>) {
    for message in batch {
        let channel_id = message.channel_id().to_owned();
        if let Err(e) = transport.send(message).await {
            warn!(
                transport = transport.name(),
                channel_id = %channel_id,
                error = %e,
                "failed to send reply"
            );
            return;
        }
    }
}
