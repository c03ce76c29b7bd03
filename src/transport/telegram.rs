//! Telegram Bot API transport.
//!
//! Uses teloxide `Bot` directly (no dispatcher): `getMe` for the bot
//! identity, `getUpdates` long polling for inbound messages, `sendMessage`
//! and `sendChatAction` for outbound traffic. Failed polls back off
//! exponentially and are reported as [`InboundEvent::TransportError`]; a
//! rejected token ends the stream with [`InboundEvent::AuthFailure`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, UpdateKind};
use teloxide::{ApiError, RequestError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use super::{EventStream, InboundEvent, InboundMessage, OutboundMessage, Transport, TransportError};

/// Initial backoff on poll failure, in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum backoff on poll failure, in milliseconds.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Extra seconds on top of the long-poll timeout for the HTTP client, so the
/// request is not cut off while Telegram holds it open.
const POLL_TIMEOUT_MARGIN_SECS: u64 = 10;

/// Longest long-poll timeout accepted, in seconds.
pub const MAX_POLL_TIMEOUT_SECS: u32 = 50;

/// Buffered inbound events before the poller waits on the consumer.
const EVENT_BUFFER: usize = 64;

/// Telegram transport settings.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    /// Bot API token.
    pub bot_token: String,
    /// Long-poll timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u32,
}

/// [`Transport`] over the Telegram Bot API.
///
/// Only one poller may run per bot token, so `connect` succeeds once.
pub struct TelegramTransport {
    bot: Bot,
    poll_timeout_secs: u32,
    connected: AtomicBool,
}

impl TelegramTransport {
    /// Create a transport. No network traffic happens until `connect`.
    ///
    /// The HTTP client timeout is sized above the long-poll timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the HTTP client cannot be built.
    pub fn new(settings: TelegramSettings) -> Result<Self, TransportError> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(http_timeout(settings.poll_timeout_secs))
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            bot: Bot::with_client(settings.bot_token, client),
            poll_timeout_secs: settings.poll_timeout_secs,
            connected: AtomicBool::new(false),
        })
    }
}

/// HTTP timeout for a long poll of `poll_timeout_secs`.
pub fn http_timeout(poll_timeout_secs: u32) -> Duration {
    Duration::from_secs(u64::from(poll_timeout_secs).saturating_add(POLL_TIMEOUT_MARGIN_SECS))
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&self) -> Result<EventStream, TransportError> {
        if self.connected.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyConnected);
        }
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let poller = Poller {
            bot: self.bot.clone(),
            poll_timeout_secs: self.poll_timeout_secs,
            events: tx,
        };
        tokio::spawn(poller.run());
        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        let chat_id = parse_chat_id(message.channel_id())?;
        match message {
            OutboundMessage::Typing { .. } => {
                self.bot
                    .send_chat_action(chat_id, ChatAction::Typing)
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?;
            }
            OutboundMessage::Text { text, .. } => {
                self.bot
                    .send_message(chat_id, text)
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Parse a textual channel id into a Telegram chat id.
pub fn parse_chat_id(channel_id: &str) -> Result<ChatId, TransportError> {
    channel_id
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| TransportError::InvalidChannel(channel_id.to_owned()))
}

/// Outcome of one poll attempt, as far as the loop is concerned.
enum PollFailure {
    Auth,
    Retry(String),
}

fn classify_error(error: &RequestError) -> PollFailure {
    match error {
        RequestError::Api(ApiError::InvalidToken) => PollFailure::Auth,
        other => PollFailure::Retry(other.to_string()),
    }
}

/// Background task feeding the event stream.
struct Poller {
    bot: Bot,
    poll_timeout_secs: u32,
    events: mpsc::Sender<InboundEvent>,
}

impl Poller {
    async fn run(self) {
        if self.announce_identity().await.is_none() {
            return;
        }

        let mut offset: Option<i32> = None;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self.bot.get_updates().timeout(self.poll_timeout_secs);
            if let Some(off) = offset {
                request = request.offset(off);
            }

            match request.await {
                Ok(updates) => {
                    backoff_ms = INITIAL_BACKOFF_MS;
                    for update in updates {
                        offset = Some(update.id.as_offset());
                        let Some(message) = normalize_update(update.kind) else {
                            continue;
                        };
                        if !self.emit(InboundEvent::Message(message)).await {
                            return;
                        }
                    }
                }
                Err(e) => match classify_error(&e) {
                    PollFailure::Auth => {
                        let _ = self.emit(InboundEvent::AuthFailure).await;
                        return;
                    }
                    PollFailure::Retry(detail) => {
                        debug!(error = %detail, backoff_ms, "telegram poll failed, backing off");
                        if !self.emit(InboundEvent::TransportError { detail }).await {
                            return;
                        }
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                    }
                },
            }
        }
    }

    /// Resolve the bot identity, retrying transient failures.
    ///
    /// Returns `None` when polling must stop (auth failure or consumer gone).
    async fn announce_identity(&self) -> Option<()> {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        loop {
            match self.bot.get_me().await {
                Ok(me) => {
                    info!(bot_id = %me.user.id, username = ?me.user.username, "telegram identity confirmed");
                    let event = InboundEvent::Connected {
                        self_id: me.user.id.to_string(),
                    };
                    return self.emit(event).await.then_some(());
                }
                Err(e) => match classify_error(&e) {
                    PollFailure::Auth => {
                        let _ = self.emit(InboundEvent::AuthFailure).await;
                        return None;
                    }
                    PollFailure::Retry(detail) => {
                        if !self.emit(InboundEvent::TransportError { detail }).await {
                            return None;
                        }
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                    }
                },
            }
        }
    }

    /// Forward an event. `false` once the consumer dropped the stream.
    async fn emit(&self, event: InboundEvent) -> bool {
        if self.events.send(event).await.is_err() {
            debug!("telegram event stream dropped, stopping poller");
            return false;
        }
        true
    }
}

/// Turn a Telegram update into a chat message, skipping everything else.
fn normalize_update(kind: UpdateKind) -> Option<InboundMessage> {
    let UpdateKind::Message(msg) = kind else {
        return None;
    };
    let text = msg.text()?.to_owned();
    let sender = msg.from.as_ref()?;
    Some(InboundMessage {
        text,
        sender_id: sender.id.to_string(),
        channel_id: msg.chat.id.to_string(),
    })
}
