//! Seams between the relay and the messaging backend.

use crate::channels::telegram::{TelegramError, TelegramUpdate};
use async_trait::async_trait;

/// Source of inbound updates (Telegram getUpdates in production).
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Wait for updates with id >= `offset`. `Ok(None)` means the stream is closed for good.
    async fn poll(&self, offset: Option<i64>) -> Result<Option<Vec<TelegramUpdate>>, TelegramError>;
}

/// Outbound text delivery, threaded under an existing message.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_reply(
        &self,
        conversation_id: i64,
        reply_to: i64,
        text: &str,
    ) -> Result<(), TelegramError>;
}
