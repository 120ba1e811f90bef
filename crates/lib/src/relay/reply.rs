//! Reply path: answer the originating message with its public link.

use crate::channels::{AttachmentRef, ReplySink, TelegramError};
use crate::config::Settings;
use std::sync::Arc;

/// Sends threaded replies. Delivery is best-effort: failures are logged and returned,
/// never retried, and callers are free to drop the result.
#[derive(Clone)]
pub struct ReplyEmitter {
    sink: Arc<dyn ReplySink>,
    file_server_url: String,
}

impl ReplyEmitter {
    pub fn new(sink: Arc<dyn ReplySink>, settings: &Settings) -> Self {
        Self {
            sink,
            file_server_url: settings.file_server_url.clone(),
        }
    }

    /// Public link for a file id: `<file-server-url>/<file_id>`.
    pub fn link_for(&self, file_id: &str) -> String {
        format!("{}/{}", self.file_server_url, file_id)
    }

    /// Send `text` to `conversation_id` as a reply to `parent_message_id`.
    pub async fn reply(
        &self,
        conversation_id: i64,
        parent_message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        match self
            .sink
            .send_reply(conversation_id, parent_message_id, text)
            .await
        {
            Ok(()) => {
                log::debug!(
                    "reply sent (chat_id: {}, reply_to: {})",
                    conversation_id,
                    parent_message_id
                );
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "failed to send reply (chat_id: {}, reply_to: {}): {}",
                    conversation_id,
                    parent_message_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// Reply to the message that carried `attachment` with its link.
    pub async fn emit_link(&self, attachment: &AttachmentRef) -> Result<(), TelegramError> {
        let link = self.link_for(&attachment.file_id);
        self.reply(attachment.conversation_id, attachment.message_id, &link)
            .await
    }
}
