//! Telegram Bot API client: long-poll getUpdates, sendMessage, getFile.

use crate::channels::handle::{ReplySink, UpdateSource};
use crate::config::Settings;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Extra time on top of the long-poll timeout before the HTTP request itself gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// Transport or decode failure. The URL (which embeds the bot token) is stripped.
    #[error("telegram request failed: {0}")]
    Request(reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
    /// 401/404 from the Bot API: the token is revoked or unknown.
    #[error("telegram rejected the bot token (status {0})")]
    Unauthorized(u16),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.without_url())
    }
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram update payload (getUpdates result item).
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<TelegramMedia>,
    /// Photo sizes, smallest first.
    #[serde(default)]
    pub photo: Vec<TelegramMedia>,
    #[serde(default)]
    pub video: Option<TelegramMedia>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Any file-bearing object (document, photo size, video); only the id matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMedia {
    pub file_id: String,
}

/// getFile result.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramFile {
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Bot API connector. Cheap to share behind an `Arc`; every call is independent.
pub struct TelegramChannel {
    token: String,
    api_base: String,
    poll_timeout: Duration,
    request_timeout: Duration,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(settings: &Settings) -> Self {
        Self {
            token: settings.bot_token.clone(),
            api_base: settings.api_base.clone(),
            poll_timeout: settings.poll_timeout,
            request_timeout: settings.request_timeout,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// HTTP timeout for one getUpdates call: the long-poll window plus grace.
    fn poll_request_timeout(&self) -> Duration {
        self.poll_timeout.saturating_add(POLL_GRACE)
    }

    /// Check status, decode the envelope, and unwrap `result`.
    async fn decode<T: DeserializeOwned>(
        method: &str,
        res: reqwest::Response,
    ) -> Result<T, TelegramError> {
        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            return Err(TelegramError::Unauthorized(status.as_u16()));
        }
        let body = res.bytes().await?;
        let data: ApiResponse<T> = match serde_json::from_slice(&body) {
            Ok(d) => d,
            Err(e) => {
                return Err(TelegramError::Api(format!(
                    "{} failed: {} (malformed response: {})",
                    method, status, e
                )))
            }
        };
        if !data.ok {
            let reason = data.description.unwrap_or_else(|| status.to_string());
            return Err(TelegramError::Api(format!("{} returned ok: false: {}", method, reason)));
        }
        data.result
            .ok_or_else(|| TelegramError::Api(format!("{} returned no result", method)))
    }

    /// Call getUpdates (long poll) for updates with id >= `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<TelegramUpdate>, TelegramError> {
        let url = format!(
            "{}?timeout={}",
            self.method_url("getUpdates"),
            self.poll_timeout.as_secs()
        );
        let url = if let Some(off) = offset {
            format!("{}&offset={}", url, off)
        } else {
            url
        };
        let res = self
            .client
            .get(&url)
            .timeout(self.poll_request_timeout())
            .send()
            .await?;
        Self::decode("getUpdates", res).await
    }

    /// Send `text` to `chat_id`, rendered as a reply to `reply_to_message_id`.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<(), TelegramError> {
        let mut body = serde_json::json!({ "chat_id": chat_id, "text": text });
        if let Some(id) = reply_to_message_id {
            body["reply_to_message_id"] = serde_json::Value::from(id);
        }
        let res = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode::<serde_json::Value>("sendMessage", res).await?;
        Ok(())
    }

    /// getFile: look up the current storage path for `file_id`.
    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile, TelegramError> {
        let res = self
            .client
            .post(self.method_url("getFile"))
            .form(&[("file_id", file_id)])
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode("getFile", res).await
    }

    /// getMe: identity of the bot behind the token.
    pub async fn get_me(&self) -> Result<TelegramUser, TelegramError> {
        let res = self
            .client
            .get(self.method_url("getMe"))
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode("getMe", res).await
    }
}

#[async_trait]
impl UpdateSource for TelegramChannel {
    async fn poll(&self, offset: Option<i64>) -> Result<Option<Vec<TelegramUpdate>>, TelegramError> {
        match self.get_updates(offset).await {
            Ok(updates) => Ok(Some(updates)),
            Err(TelegramError::Unauthorized(status)) => {
                log::warn!("telegram: getUpdates rejected with status {}, no more updates", status);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ReplySink for TelegramChannel {
    async fn send_reply(
        &self,
        conversation_id: i64,
        reply_to: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        self.send_message(conversation_id, text, Some(reply_to)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_photo_sizes_deserializes_in_order() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 7,
                "chat": {"id": -100},
                "from": {"id": 1, "username": "alice"},
                "photo": [
                    {"file_id": "S", "width": 90},
                    {"file_id": "M", "width": 320},
                    {"file_id": "L", "width": 1280}
                ]
            }
        }"#;
        let u: TelegramUpdate = serde_json::from_str(json).unwrap();
        let msg = u.message.unwrap();
        assert_eq!(msg.chat.id, -100);
        let ids: Vec<&str> = msg.photo.iter().map(|p| p.file_id.as_str()).collect();
        assert_eq!(ids, ["S", "M", "L"]);
        assert!(msg.document.is_none());
    }

    #[test]
    fn update_without_message_deserializes() {
        let u: TelegramUpdate =
            serde_json::from_str(r#"{"update_id": 3, "edited_message": {}}"#).unwrap();
        assert!(u.message.is_none());
    }

    #[test]
    fn get_file_envelope_without_result_keeps_ok_false() {
        let r: ApiResponse<TelegramFile> =
            serde_json::from_str(r#"{"ok": false, "error_code": 400, "description": "Bad Request: invalid file_id"}"#)
                .unwrap();
        assert!(!r.ok);
        assert!(r.result.is_none());
        assert_eq!(r.description.as_deref(), Some("Bad Request: invalid file_id"));
    }

    #[test]
    fn method_url_embeds_token() {
        let settings = Settings::for_tests("http://127.0.0.1:9");
        let t = TelegramChannel::new(&settings);
        assert_eq!(t.method_url("getFile"), "http://127.0.0.1:9/bot123:test-token/getFile");
    }

    #[test]
    fn poll_request_timeout_adds_grace_without_overflow() {
        let mut settings = Settings::for_tests("http://127.0.0.1:9");
        assert_eq!(
            TelegramChannel::new(&settings).poll_request_timeout(),
            Duration::from_secs(11)
        );
        settings.poll_timeout = Duration::MAX;
        assert_eq!(TelegramChannel::new(&settings).poll_request_timeout(), Duration::MAX);
    }
}
