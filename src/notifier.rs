//! The notifier: check-result alerts out, chat commands in.
//!
//! [`Notifier::notify`] is called by the check pipeline on its own schedule.
//! [`Notifier::run`] is the event loop over the transport's inbound stream;
//! [`Notifier::start`] spawns it in the background right after construction.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::check::CheckResult;
use crate::dispatch::{DispatchConfig, DispatchRejected, ReplyDispatcher};
use crate::responder::{Responder, ResponderConfig};
use crate::tracker::StateTracker;
use crate::transport::{InboundEvent, InboundMessage, OutboundMessage, Transport};

/// Everything a [`Notifier`] needs besides its transport.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    /// Channel that receives down alerts.
    pub channel_id: String,
    /// Append "last checked <timestamp>" to alerts.
    pub include_timestamp: bool,
    /// Command table and phrasing.
    pub responder: ResponderConfig,
    /// Reply delivery limits.
    pub dispatch: DispatchConfig,
    /// Fixed RNG seed for greetings; entropy when `None`.
    pub rng_seed: Option<u64>,
}

impl NotifierSettings {
    /// Defaults for everything except the alert channel.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            include_timestamp: true,
            responder: ResponderConfig::default(),
            dispatch: DispatchConfig::default(),
            rng_seed: None,
        }
    }
}

/// Outcome of one [`Notifier::notify`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Results examined.
    pub checked: usize,
    /// Alerts delivered.
    pub alerted: usize,
    /// Alerts the transport failed to deliver.
    pub failed: usize,
}

/// Why the event loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The platform rejected the credentials.
    AuthFailed,
    /// The inbound stream ended.
    StreamClosed,
    /// The transport could not be opened.
    ConnectFailed,
}

/// Bridges check results and chat commands to one transport.
pub struct Notifier {
    transport: Arc<dyn Transport>,
    channel_id: String,
    include_timestamp: bool,
    states: Mutex<StateTracker>,
    responder: Responder,
    replies: ReplyDispatcher,
    bot_id: RwLock<Option<String>>,
}

impl Notifier {
    /// Build a notifier without starting its event loop.
    ///
    /// Spawns the reply dispatcher, so it must be called inside a tokio
    /// runtime.
    pub fn new(transport: Arc<dyn Transport>, settings: NotifierSettings) -> Self {
        let responder = match settings.rng_seed {
            Some(seed) => Responder::with_seed(settings.responder, seed),
            None => Responder::new(settings.responder),
        };
        let replies = ReplyDispatcher::spawn(Arc::clone(&transport), &settings.dispatch);
        Self {
            transport,
            channel_id: settings.channel_id,
            include_timestamp: settings.include_timestamp,
            states: Mutex::new(StateTracker::new()),
            responder,
            replies,
            bot_id: RwLock::new(None),
        }
    }

    /// Build a notifier and spawn its event loop.
    pub fn start(
        transport: Arc<dyn Transport>,
        settings: NotifierSettings,
    ) -> (Arc<Self>, JoinHandle<LoopExit>) {
        let notifier = Arc::new(Self::new(transport, settings));
        let looped = Arc::clone(&notifier);
        let handle = tokio::spawn(async move { looped.run().await });
        (notifier, handle)
    }

    /// The bot's own identity, once the transport has connected.
    pub fn bot_id(&self) -> Option<String> {
        self.bot_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Channel receiving down alerts.
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Tracked endpoint states.
    pub fn states(&self) -> &Mutex<StateTracker> {
        &self.states
    }

    /// Process a batch of check results, alerting on new down-transitions.
    ///
    /// Never fails: delivery problems are logged and counted in the report.
    pub async fn notify(&self, results: &[CheckResult]) -> NotifyReport {
        let mut report = NotifyReport::default();

        for result in results {
            report.checked = report.checked.saturating_add(1);

            let should_alert = self.states.lock().await.update(result);
            if !should_alert {
                continue;
            }

            let text = self.alert_text(result);
            match self
                .transport
                .send(OutboundMessage::text(&self.channel_id, &text))
                .await
            {
                Ok(()) => {
                    info!(endpoint = %result.title, "down alert sent");
                    report.alerted = report.alerted.saturating_add(1);
                }
                Err(e) => {
                    warn!(
                        endpoint = %result.title,
                        transport = self.transport.name(),
                        error = %e,
                        "failed to send down alert"
                    );
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        report
    }

    fn alert_text(&self, result: &CheckResult) -> String {
        if self.include_timestamp {
            format!(
                "{} is currently down, last checked {}",
                result.title, result.timestamp
            )
        } else {
            format!("{} is currently down", result.title)
        }
    }

    /// Consume the transport's inbound events until auth fails or the
    /// stream ends.
    pub async fn run(&self) -> LoopExit {
        let transport = self.transport.name();
        let mut events = match self.transport.connect().await {
            Ok(events) => events,
            Err(e) => {
                error!(transport, error = %e, "failed to connect transport");
                return LoopExit::ConnectFailed;
            }
        };

        while let Some(event) = events.next().await {
            match event {
                InboundEvent::Connected { self_id } => {
                    info!(transport, bot_id = %self_id, "connected");
                    *self.bot_id.write().unwrap_or_else(PoisonError::into_inner) = Some(self_id);
                }
                InboundEvent::Message(message) => self.handle_message(&message),
                InboundEvent::TransportError { detail } => {
                    warn!(transport, error = %detail, "transport error");
                }
                InboundEvent::AuthFailure => {
                    error!(transport, "failed to authenticate, stopping event loop");
                    return LoopExit::AuthFailed;
                }
            }
        }

        info!(transport, "inbound stream closed");
        LoopExit::StreamClosed
    }

    fn handle_message(&self, message: &InboundMessage) {
        if self.bot_id().as_deref() == Some(message.sender_id.as_str()) {
            return;
        }

        let replies = self.responder.respond(message);
        if replies.is_empty() {
            return;
        }

        debug!(
            channel_id = %message.channel_id,
            sender_id = %message.sender_id,
            "command matched"
        );
        if let Err(DispatchRejected::Closed) = self.replies.try_dispatch(replies) {
            warn!("reply dispatcher closed, reply dropped");
        }
    }
}
