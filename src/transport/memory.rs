//! In-process transport backed by tokio channels.
//!
//! [`MemoryTransport::new`] returns the transport and a [`MemoryPeer`] that
//! plays the chat service: it injects inbound events and observes everything
//! the bot sends, in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{EventStream, InboundEvent, InboundMessage, OutboundMessage, Transport, TransportError};

/// Channel-backed [`Transport`].
pub struct MemoryTransport {
    inbound: Mutex<Option<mpsc::UnboundedReceiver<InboundEvent>>>,
    sent: mpsc::UnboundedSender<OutboundMessage>,
    fail_sends: AtomicBool,
}

/// The chat-service side of a [`MemoryTransport`].
pub struct MemoryPeer {
    inbound: mpsc::UnboundedSender<InboundEvent>,
    sent: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl MemoryTransport {
    /// Create a connected transport/peer pair.
    pub fn new() -> (Self, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let transport = Self {
            inbound: Mutex::new(Some(inbound_rx)),
            sent: sent_tx,
            fail_sends: AtomicBool::new(false),
        };
        let peer = MemoryPeer {
            inbound: inbound_tx,
            sent: sent_rx,
        };
        (transport, peer)
    }

    /// Make every subsequent `send` fail (or succeed again).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn connect(&self) -> Result<EventStream, TransportError> {
        let receiver = self
            .inbound
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
            .ok_or(TransportError::AlreadyConnected)?;
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Request("simulated send failure".to_owned()));
        }
        self.sent.send(message).map_err(|_| TransportError::Closed)
    }
}

impl MemoryPeer {
    /// Inject an inbound event. Returns `false` once the bot stopped listening.
    pub fn push(&self, event: InboundEvent) -> bool {
        self.inbound.send(event).is_ok()
    }

    /// Inject a chat message.
    pub fn say(&self, sender_id: &str, channel_id: &str, text: &str) -> bool {
        self.push(InboundEvent::Message(InboundMessage {
            text: text.to_owned(),
            sender_id: sender_id.to_owned(),
            channel_id: channel_id.to_owned(),
        }))
    }

    /// Wait for the next message the bot sent.
    pub async fn next_sent(&mut self) -> Option<OutboundMessage> {
        self.sent.recv().await
    }

    /// Take every message sent so far without waiting.
    pub fn drain_sent(&mut self) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        while let Ok(message) = self.sent.try_recv() {
            out.push(message);
        }
        out
    }

    /// Whether the bot dropped its end of the inbound stream.
    pub fn is_closed(&self) -> bool {
        self.inbound.is_closed()
    }
}
