//! File resolution: transient Telegram file id -> current storage path via getFile.
//!
//! No caching. Telegram may rotate paths, so every lookup goes to the Bot API.

use crate::channels::{TelegramChannel, TelegramError};
use crate::config::Settings;
use async_trait::async_trait;
use std::sync::Arc;

/// Backend-relative storage path returned by getFile. Valid for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(String);

impl ResolvedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Download URL on the file host: `<file-server-url>/d/<path>`.
    pub fn redirect_target(&self, file_server_url: &str) -> String {
        format!(
            "{}/d/{}",
            file_server_url.trim_end_matches('/'),
            self.0.trim_start_matches('/')
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("request to telegram failed: {0}")]
    Transport(String),
    #[error("telegram could not resolve the file: {0}")]
    Rejected(String),
    #[error("telegram returned no file path")]
    MissingPath,
}

/// Anything that can turn a file id into a storage path. The redirect server only sees this.
#[async_trait]
pub trait PathResolver: Send + Sync {
    async fn resolve(&self, file_id: &str) -> Result<ResolvedPath, ResolveError>;
}

/// getFile-backed resolver.
pub struct FileResolver {
    telegram: Arc<TelegramChannel>,
    token: String,
}

impl FileResolver {
    pub fn new(telegram: Arc<TelegramChannel>, settings: &Settings) -> Self {
        Self {
            telegram,
            token: settings.bot_token.clone(),
        }
    }

    /// Map a Bot API error to a resolution failure, scrubbing the token from the message.
    fn classify(&self, err: TelegramError) -> ResolveError {
        match err {
            TelegramError::Request(e) => ResolveError::Transport(self.redact(&e.to_string())),
            TelegramError::Api(msg) => ResolveError::Rejected(self.redact(&msg)),
            TelegramError::Unauthorized(status) => {
                ResolveError::Rejected(format!("bot token rejected (status {})", status))
            }
        }
    }

    fn redact(&self, message: &str) -> String {
        if self.token.is_empty() {
            message.to_string()
        } else {
            message.replace(&self.token, "<redacted>")
        }
    }
}

#[async_trait]
impl PathResolver for FileResolver {
    async fn resolve(&self, file_id: &str) -> Result<ResolvedPath, ResolveError> {
        let file = self
            .telegram
            .get_file(file_id)
            .await
            .map_err(|e| self.classify(e))?;
        match file.file_path {
            Some(p) if !p.is_empty() => Ok(ResolvedPath::new(p)),
            _ => Err(ResolveError::MissingPath),
        }
    }
}
