//! Outbound side of the relay — the two things the bot ever says to a chat.
//!
//! The relay is generic over [`Outbound`] so the Telegram implementation can
//! be swapped for a recording fake in tests.

use std::future::Future;

use thiserror::Error;

/// A reply or chat action the platform refused to deliver.
#[derive(Debug, Error)]
#[error("delivery to chat {chat_id} failed: {message}")]
pub struct SendError {
    pub chat_id: i64,
    pub message: String,
}

impl SendError {
    pub fn new(chat_id: i64, message: impl Into<String>) -> Self {
        Self { chat_id, message: message.into() }
    }
}

/// Delivery capability handed to the relay at construction.
///
/// Both operations report their outcome; the relay decides what to do with a
/// failure (today: log it and move on).
pub trait Outbound: Clone + Send + Sync + 'static {
    /// Send `text` to `chat_id`.
    fn send_text(
        &self,
        chat_id: i64,
        text: String,
    ) -> impl Future<Output = Result<(), SendError>> + Send;

    /// Show the "typing…" presence indicator in `chat_id`.
    fn send_typing(&self, chat_id: i64) -> impl Future<Output = Result<(), SendError>> + Send;
}
