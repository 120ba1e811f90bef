//! Ingestion loop: long-poll Telegram and answer each attachment with its link.

use crate::channels::{InboundEvent, TelegramUpdate, UpdateSource};
use crate::relay::ReplyEmitter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Single sequential worker over the update stream. Replies go out in arrival order.
pub struct UpdateIngestor {
    source: Arc<dyn UpdateSource>,
    emitter: ReplyEmitter,
    retry_delay: Duration,
    /// Next update id to ask for. In memory only; a restart resumes from whatever Telegram still holds.
    offset: Option<i64>,
}

impl UpdateIngestor {
    pub fn new(source: Arc<dyn UpdateSource>, emitter: ReplyEmitter, retry_delay: Duration) -> Self {
        Self {
            source,
            emitter,
            retry_delay,
            offset: None,
        }
    }

    /// Poll and dispatch until `shutdown` flips to true (or its sender is dropped),
    /// or until the source reports the stream closed.
    ///
    /// Shutdown is honored between batches: an in-flight poll is abandoned, but a batch
    /// that has been received is always dispatched in full.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!("update ingestor: starting getUpdates long-poll loop");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let polled = tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                res = self.source.poll(self.offset) => res,
            };
            match polled {
                Ok(Some(updates)) => {
                    if let Some(max) = updates.iter().map(|u| u.update_id).max() {
                        self.offset = Some(max + 1);
                    }
                    for update in &updates {
                        self.dispatch(update).await;
                    }
                }
                Ok(None) => {
                    log::info!("update ingestor: update stream closed");
                    break;
                }
                Err(e) => {
                    log::warn!("update ingestor: getUpdates error: {}", e);
                    tokio::select! {
                        biased;
                        _ = stop_requested(&mut shutdown) => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }
        log::info!("update ingestor: stopped");
    }

    async fn dispatch(&self, update: &TelegramUpdate) {
        let Some(event) = InboundEvent::from_update(update) else {
            return;
        };
        log::debug!(
            "message received (update: {}, message_id: {}, from: {}, chat_id: {})",
            event.sequence,
            event.message_id,
            event.sender.as_deref().unwrap_or("-"),
            event.conversation_id
        );
        if event.is_command() {
            log::info!(
                "ignoring command /{} in chat {}",
                event.command().unwrap_or(""),
                event.conversation_id
            );
            return;
        }
        let (Some(kind), Some(attachment)) = (
            event.attachment.as_ref().map(|a| a.kind),
            event.attachment_ref(),
        ) else {
            return;
        };
        log::info!(
            "{} {} received in chat {}, replying with link",
            kind.as_str(),
            attachment.file_id,
            attachment.conversation_id
        );
        // Best-effort: the emitter has already logged a failure and the loop must go on.
        let _ = self.emitter.emit_link(&attachment).await;
    }
}

/// Completes once shutdown is requested or the sender is gone.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
