//! Messaging channel (Telegram).
//!
//! Bot API client, the inbound event model, and the traits the relay talks to
//! so the ingestion loop and reply path can run against fakes in tests.

mod handle;
mod inbound;
mod telegram;

pub use handle::{ReplySink, UpdateSource};
pub use inbound::{Attachment, AttachmentKind, AttachmentRef, InboundEvent};
pub use telegram::{
    TelegramChannel, TelegramChat, TelegramError, TelegramFile, TelegramMedia, TelegramMessage,
    TelegramUpdate, TelegramUser,
};
