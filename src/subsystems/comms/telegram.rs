//! Telegram comms channel — long-polls the Bot API via teloxide, hands each
//! message to the [`Relay`], and implements [`Outbound`] on top of `Bot`.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::error::AppError;
use crate::llm::LlmProvider;
use crate::subsystems::relay::{IncomingMessage, Outbound, Relay, SendError};
use crate::subsystems::runtime::{Component, ComponentFuture};

// ── Constants ────────────────────────────────────────────────────────────────

/// Telegram's per-message limit, counted in UTF-16 code units.
const MAX_MESSAGE_UNITS: usize = 4096;

/// Sent instead of an empty reply, which Telegram would reject.
const EMPTY_REPLY: &str = "(empty response)";

// ── Outbound ─────────────────────────────────────────────────────────────────

/// [`Outbound`] backed by a teloxide [`Bot`]. Clones share one HTTP client.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl Outbound for TelegramOutbound {
    /// Long texts go out as consecutive messages; delivery stops at the first
    /// chunk Telegram refuses.
    async fn send_text(&self, chat_id: i64, text: String) -> Result<(), SendError> {
        for chunk in split_message(&text, MAX_MESSAGE_UNITS) {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .map_err(|e| SendError::new(chat_id, e.to_string()))?;
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), SendError> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map(|_| ())
            .map_err(|e| SendError::new(chat_id, e.to_string()))
    }
}

impl From<&Message> for IncomingMessage {
    fn from(msg: &Message) -> Self {
        IncomingMessage::new(msg.chat.id.0, msg.text().map(str::to_owned))
    }
}

/// Split `text` into pieces of at most `max_units` UTF-16 code units without
/// breaking a character. The pieces concatenate back to `text`.
fn split_message(text: &str, max_units: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![EMPTY_REPLY.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut units = 0;
    for c in text.chars() {
        let len = c.len_utf16();
        if units + len > max_units && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            units = 0;
        }
        current.push(c);
        units += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ── TelegramChannel ──────────────────────────────────────────────────────────

/// The Telegram channel component. Owns the relay it drives.
pub struct TelegramChannel {
    channel_id: String,
    token: String,
    expected_username: Option<String>,
    relay: RelayConfig,
    provider: LlmProvider,
}

impl TelegramChannel {
    pub fn new(
        channel_id: impl Into<String>,
        token: String,
        expected_username: Option<String>,
        relay: RelayConfig,
        provider: LlmProvider,
    ) -> Self {
        Self { channel_id: channel_id.into(), token, expected_username, relay, provider }
    }
}

impl Component for TelegramChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_telegram(*self, shutdown))
    }
}

// ── run_telegram ─────────────────────────────────────────────────────────────

async fn run_telegram(channel: TelegramChannel, shutdown: CancellationToken) -> Result<(), AppError> {
    let TelegramChannel { channel_id, token, expected_username, relay, provider } = channel;

    info!(%channel_id, "telegram channel starting");

    let bot = Bot::new(token);

    let me = bot
        .get_me()
        .await
        .map_err(|e| AppError::Comms(format!("telegram getMe failed: {e}")))?;
    let username = me.username().to_string();
    if let Some(expected) = &expected_username {
        if !expected.eq_ignore_ascii_case(&username) {
            warn!(%channel_id, %expected, actual = %username, "TELEGRAM_BOT_USERNAME does not match the token's bot — using the actual username");
        }
    }
    info!(%channel_id, %username, "telegram bot authenticated");

    let grace = Duration::from_secs(relay.shutdown_grace_seconds);
    let relay = Relay::new(&relay, provider, TelegramOutbound::new(bot.clone()), Some(username));

    let handler = Update::filter_message().endpoint({
        let relay = relay.clone();
        let channel_id = channel_id.clone();
        move |msg: Message| {
            let relay = relay.clone();
            let channel_id = channel_id.clone();
            async move {
                debug!(
                    %channel_id,
                    chat_id = msg.chat.id.0,
                    from = ?msg.from.as_ref().and_then(|u| u.username.as_ref()),
                    "telegram received message"
                );
                relay.handle(IncomingMessage::from(&msg)).await;
                respond(())
            }
        }
    });

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .build();

    tokio::select! {
        biased;

        _ = shutdown.cancelled() => {
            info!(%channel_id, "shutdown signal received — closing telegram channel");
        }
        _ = dispatcher.dispatch() => {
            warn!(%channel_id, "telegram dispatcher exited unexpectedly");
        }
    }

    relay.drain(grace).await;
    info!(%channel_id, "telegram channel stopped");
    Ok(())
}
