//! Transports: the real-time connection to a chat service.
//!
//! A transport opens a long-lived connection and yields [`InboundEvent`]s as
//! a stream; outbound traffic goes through [`Transport::send`]. Reconnects are
//! the transport's own business. Only an authentication failure is surfaced
//! as terminal.

use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio_stream::Stream;

pub mod memory;
pub mod telegram;

/// Lazy sequence of events produced by [`Transport::connect`].
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// A chat message addressed to the bot's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Raw message text.
    pub text: String,
    /// Platform identifier of the author.
    pub sender_id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
}

/// Events delivered by a connected transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The connection is up and the platform confirmed the bot identity.
    Connected {
        /// The bot's own user identifier.
        self_id: String,
    },
    /// Someone posted a message.
    Message(InboundMessage),
    /// A recoverable transport problem; the transport keeps retrying.
    TransportError {
        /// Human-readable description.
        detail: String,
    },
    /// Credentials were rejected. No further events follow.
    AuthFailure,
}

/// Messages the bot can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// "Bot is typing" indicator.
    Typing {
        /// Target channel.
        channel_id: String,
    },
    /// Plain text message.
    Text {
        /// Target channel.
        channel_id: String,
        /// Message body.
        text: String,
    },
}

impl OutboundMessage {
    /// Build a text message for `channel_id`.
    pub fn text(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            channel_id: channel_id.into(),
            text: text.into(),
        }
    }

    /// Build a typing indicator for `channel_id`.
    pub fn typing(channel_id: impl Into<String>) -> Self {
        Self::Typing {
            channel_id: channel_id.into(),
        }
    }

    /// Channel this message is addressed to.
    pub fn channel_id(&self) -> &str {
        match self {
            Self::Typing { channel_id } | Self::Text { channel_id, .. } => channel_id,
        }
    }
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform API call failed.
    #[error("request failed: {0}")]
    Request(String),
    /// The channel identifier is not valid for this platform.
    #[error("invalid channel id: {0}")]
    InvalidChannel(String),
    /// `connect` was called on a transport that is already connected.
    #[error("transport already connected")]
    AlreadyConnected,
    /// The underlying connection is gone.
    #[error("transport closed")]
    Closed,
}

/// A bidirectional real-time chat connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in log fields (e.g. `"telegram"`).
    fn name(&self) -> &str;

    /// Open the connection and return the inbound event stream.
    async fn connect(&self) -> Result<EventStream, TransportError>;

    /// Deliver one outbound message.
    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError>;
}
