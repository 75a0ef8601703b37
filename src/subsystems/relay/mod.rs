//! Relay — turns one inbound chat message into one completion and one reply.
//!
//! # Flow
//!
//! For each message handed to [`Relay::handle`]:
//!
//! - no text → ignored, nothing is sent;
//! - the start command → the welcome reply, no completion;
//! - anything else → typing indicator, then a spawned exchange that calls the
//!   provider and sends exactly one reply.
//!
//! `handle` returns as soon as the exchange is spawned, so the platform's
//! dispatcher is never blocked on the completion endpoint.
//!
//! # Concurrency
//!
//! Exchanges run on a [`TaskTracker`] and each holds an [`InFlightLimiter`]
//! permit for its whole lifetime. With [`OverflowPolicy::Queue`] an exchange
//! waits for a permit; with [`OverflowPolicy::Reject`] the chat gets the busy
//! reply instead. Exchanges share nothing but the limiter.

mod limiter;
pub mod outbound;

pub use limiter::InFlightLimiter;
pub use outbound::{Outbound, SendError};

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::OwnedSemaphorePermit;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use crate::config::{OverflowPolicy, RelayConfig, Replies};
use crate::llm::LlmProvider;

// ── Types ─────────────────────────────────────────────────────────────────────

/// The only part of a platform update the relay looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub text: Option<String>,
}

impl IncomingMessage {
    pub fn new(chat_id: i64, text: Option<String>) -> Self {
        Self { chat_id, text }
    }

    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, text: Some(text.into()) }
    }
}

/// What [`Relay::handle`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// No text; nothing was sent.
    Ignored,
    /// Start command; the welcome reply was sent.
    Welcomed,
    /// An exchange was spawned.
    Dispatched,
    /// The limiter was full under the reject policy; the busy reply was sent.
    Rejected,
}

// ── Relay ─────────────────────────────────────────────────────────────────────

/// Inbound handler. Cheap to clone — all clones share one limiter and tracker.
pub struct Relay<O: Outbound> {
    inner: Arc<Inner<O>>,
}

impl<O: Outbound> Clone for Relay<O> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

struct Inner<O> {
    outbound: O,
    provider: LlmProvider,
    persona: String,
    start_command: String,
    /// Username without `@`, used to recognise `/start@<username>`.
    bot_username: Option<String>,
    replies: Replies,
    limiter: InFlightLimiter,
    tracker: TaskTracker,
}

impl<O: Outbound> Relay<O> {
    /// Build a relay from its configuration and injected dependencies.
    pub fn new(
        config: &RelayConfig,
        provider: LlmProvider,
        outbound: O,
        bot_username: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                outbound,
                provider,
                persona: config.persona.clone(),
                start_command: config.start_command.clone(),
                bot_username,
                replies: config.replies.clone(),
                limiter: InFlightLimiter::new(config.max_in_flight, config.overflow),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Handle one inbound message. Never fails: every problem ends up in the
    /// log and, where a reply is due, in a canned reply.
    pub async fn handle(&self, msg: IncomingMessage) -> Handled {
        let chat_id = msg.chat_id;
        let text = match msg.text {
            Some(text) if !text.is_empty() => text,
            _ => {
                trace!(chat_id, "ignoring message without text");
                return Handled::Ignored;
            }
        };

        if self.is_start_command(&text) {
            debug!(chat_id, "start command");
            self.inner.deliver(chat_id, self.inner.replies.welcome.clone()).await;
            return Handled::Welcomed;
        }

        let permit = match self.inner.limiter.policy() {
            OverflowPolicy::Queue => None,
            OverflowPolicy::Reject => match self.inner.limiter.try_admit() {
                Some(permit) => Some(permit),
                None => {
                    warn!(
                        chat_id,
                        in_flight = self.inner.limiter.in_flight(),
                        "in-flight limit reached — rejecting message"
                    );
                    self.inner.deliver(chat_id, self.inner.replies.busy.clone()).await;
                    return Handled::Rejected;
                }
            },
        };

        if let Err(e) = self.inner.outbound.send_typing(chat_id).await {
            warn!(chat_id, error = %e, "failed to send typing indicator");
        }

        debug!(chat_id, text_len = text.len(), "dispatching exchange");
        let inner = self.inner.clone();
        self.inner.tracker.spawn(inner.exchange(chat_id, text, permit));
        Handled::Dispatched
    }

    /// `true` for the configured start command, or its `/start@<username>`
    /// form when the bot's username is known.
    pub fn is_start_command(&self, text: &str) -> bool {
        let command = self.inner.start_command.as_str();
        if text == command {
            return true;
        }
        match (&self.inner.bot_username, text.strip_prefix(command).and_then(|r| r.strip_prefix('@'))) {
            (Some(username), Some(addressed)) => addressed.eq_ignore_ascii_case(username),
            _ => false,
        }
    }

    /// Exchanges currently holding an in-flight permit.
    pub fn in_flight(&self) -> usize {
        self.inner.limiter.in_flight()
    }

    /// Exchanges spawned and not yet finished (running or queued).
    pub fn pending(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Wait up to `grace` for spawned exchanges to finish.
    ///
    /// Returns `false` if the grace period ran out; remaining exchanges are
    /// abandoned when the runtime shuts down.
    pub async fn drain(&self, grace: Duration) -> bool {
        let tracker = &self.inner.tracker;
        tracker.close();
        let pending = tracker.len();
        if pending == 0 {
            return true;
        }

        info!(pending, "waiting for in-flight exchanges");
        if tokio::time::timeout(grace, tracker.wait()).await.is_ok() {
            true
        } else {
            warn!(pending = tracker.len(), "shutdown grace elapsed — abandoning in-flight exchanges");
            false
        }
    }
}

impl<O: Outbound> Inner<O> {
    /// One spawned unit of work: completion, then reply. Owns its chat id and
    /// text; a failure here only ever affects this chat.
    async fn exchange(self: Arc<Self>, chat_id: i64, text: String, permit: Option<OwnedSemaphorePermit>) {
        let _permit = match permit {
            Some(permit) => permit,
            None => match self.limiter.admit().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(chat_id, error = %e, "in-flight limiter closed");
                    self.deliver(chat_id, self.replies.error.clone()).await;
                    return;
                }
            },
        };

        let outcome = AssertUnwindSafe(self.provider.complete(&self.persona, &text))
            .catch_unwind()
            .await;

        let reply = match outcome {
            Ok(Ok(reply)) => {
                debug!(chat_id, reply_len = reply.len(), "completion ready");
                reply
            }
            Ok(Err(e)) if e.is_unavailable() => {
                warn!(chat_id, error = %e, "completion service unavailable");
                self.replies.unavailable.clone()
            }
            Ok(Err(e)) => {
                error!(chat_id, error = %e, "failed to process message");
                self.replies.error.clone()
            }
            Err(panic) => {
                error!(chat_id, panic = %panic_message(panic.as_ref()), "exchange panicked");
                self.replies.error.clone()
            }
        };

        self.deliver(chat_id, reply).await;
    }

    /// Send a reply; a delivery failure is logged and otherwise ignored.
    async fn deliver(&self, chat_id: i64, text: String) {
        if let Err(e) = self.outbound.send_text(chat_id, text).await {
            warn!(chat_id, error = %e, "failed to deliver reply");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
