//! Inbound event model: what the relay needs out of one Telegram update.

use crate::channels::telegram::{TelegramMessage, TelegramUpdate};

/// Attachment kinds the relay forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Document,
    Photo,
    Video,
}

impl AttachmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_id: String,
}

/// One message update from the bot's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Telegram update_id; the next poll asks for ids above it.
    pub sequence: i64,
    pub conversation_id: i64,
    pub message_id: i64,
    pub sender: Option<String>,
    pub attachment: Option<Attachment>,
    pub text: Option<String>,
}

/// Everything needed to answer one attachment with a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub file_id: String,
    pub conversation_id: i64,
    pub message_id: i64,
}

impl InboundEvent {
    /// None for updates that carry no message (edits, callbacks, ...).
    pub fn from_update(update: &TelegramUpdate) -> Option<Self> {
        let msg = update.message.as_ref()?;
        Some(Self {
            sequence: update.update_id,
            conversation_id: msg.chat.id,
            message_id: msg.message_id,
            sender: msg.from.as_ref().and_then(|u| u.username.clone()),
            attachment: select_attachment(msg),
            text: msg.text.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Bot command: text starting with '/'.
    pub fn is_command(&self) -> bool {
        self.text.as_deref().is_some_and(|t| t.starts_with('/'))
    }

    /// Command name without the leading '/' or a trailing "@botname".
    pub fn command(&self) -> Option<&str> {
        if !self.is_command() {
            return None;
        }
        let t = self.text.as_deref()?;
        let word = t[1..].split_whitespace().next().unwrap_or("");
        Some(word.split('@').next().unwrap_or(word))
    }

    pub fn attachment_ref(&self) -> Option<AttachmentRef> {
        self.attachment.as_ref().map(|a| AttachmentRef {
            file_id: a.file_id.clone(),
            conversation_id: self.conversation_id,
            message_id: self.message_id,
        })
    }
}

/// Document first, then the largest photo size (Telegram lists them ascending), then video.
fn select_attachment(msg: &TelegramMessage) -> Option<Attachment> {
    if let Some(ref d) = msg.document {
        return Some(Attachment {
            kind: AttachmentKind::Document,
            file_id: d.file_id.clone(),
        });
    }
    if let Some(p) = msg.photo.last() {
        return Some(Attachment {
            kind: AttachmentKind::Photo,
            file_id: p.file_id.clone(),
        });
    }
    msg.video.as_ref().map(|v| Attachment {
        kind: AttachmentKind::Video,
        file_id: v.file_id.clone(),
    })
}
