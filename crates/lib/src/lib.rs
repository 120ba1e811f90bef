//! tg-file-share core library: Telegram ingestion, link replies, and the public
//! redirect server that turns file ids into download URLs.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod relay;
