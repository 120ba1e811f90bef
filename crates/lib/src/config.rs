//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.tg-file-share/config.json`) and environment.
//! [`Settings`] is the validated form handed to every component at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP listener for the public redirect endpoint.
    #[serde(default)]
    pub server: ServerConfig,

    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Public base URL of the file host (e.g. "https://files.example.com"). Overridden by FILE_SERVER_URL env.
    #[serde(default)]
    pub file_server_url: Option<String>,
}

/// Bind address and port for the redirect server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port (default 8001).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    8001
}

fn default_server_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// Telegram Bot API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Bot API base URL (default "https://api.telegram.org").
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Long-poll timeout passed to getUpdates, in seconds (default 60).
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Pause after a failed poll before the next cycle, in seconds (default 2).
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// HTTP timeout for sendMessage, getFile and getMe, in seconds (default 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    60
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Upper bound for pollTimeoutSecs and requestTimeoutSecs.
const MAX_TIMEOUT_SECS: u64 = 3600;

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Startup validation failure. Fatal: nothing is started when this is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("telegram bot token is not configured (set telegram.botToken or TELEGRAM_BOT_TOKEN)")]
    MissingBotToken,
    #[error("file server url is not configured (set fileServerUrl or FILE_SERVER_URL)")]
    MissingFileServerUrl,
}

/// Validated runtime settings. Built once at startup and shared read-only.
#[derive(Clone)]
pub struct Settings {
    pub bot_token: String,
    /// Public file host base URL without trailing slash.
    pub file_server_url: String,
    pub api_base: String,
    pub poll_timeout: Duration,
    pub retry_delay: Duration,
    /// Timeout for every Bot API call other than the getUpdates long poll.
    pub request_timeout: Duration,
    pub bind: String,
    pub port: u16,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("bot_token", &"<redacted>")
            .field("file_server_url", &self.file_server_url)
            .field("api_base", &self.api_base)
            .field("poll_timeout", &self.poll_timeout)
            .field("retry_delay", &self.retry_delay)
            .field("request_timeout", &self.request_timeout)
            .field("bind", &self.bind)
            .field("port", &self.port)
            .finish()
    }
}

impl Settings {
    /// Validate config with env overrides applied.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::with_overrides(
            config,
            env_value("TELEGRAM_BOT_TOKEN"),
            env_value("FILE_SERVER_URL"),
        )
    }

    fn with_overrides(
        config: &Config,
        env_token: Option<String>,
        env_file_server_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bot_token = prefer_env(env_token, config.telegram.bot_token.as_deref())
            .ok_or(ConfigError::MissingBotToken)?;
        let file_server_url = prefer_env(env_file_server_url, config.file_server_url.as_deref())
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingFileServerUrl)?;
        Ok(Self {
            bot_token,
            file_server_url,
            api_base: config.telegram.api_base.trim().trim_end_matches('/').to_string(),
            poll_timeout: timeout_secs(config.telegram.poll_timeout_secs),
            retry_delay: Duration::from_secs(config.telegram.retry_delay_secs),
            request_timeout: timeout_secs(config.telegram.request_timeout_secs),
            bind: config.server.bind.trim().to_string(),
            port: config.server.port,
        })
    }

    /// "bind:port" for the redirect listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
impl Settings {
    /// Loopback settings with short timeouts, pointed at `api_base`.
    pub(crate) fn for_tests(api_base: &str) -> Self {
        Self {
            bot_token: "123:test-token".to_string(),
            file_server_url: "https://files.example.com".to_string(),
            api_base: api_base.to_string(),
            poll_timeout: Duration::from_secs(1),
            retry_delay: Duration::from_millis(10),
            request_timeout: Duration::from_secs(1),
            bind: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

/// Zero would turn the long poll into a busy loop; clamp into 1..=MAX_TIMEOUT_SECS.
fn timeout_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, MAX_TIMEOUT_SECS))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Env value wins when non-blank; otherwise the trimmed config value if non-blank.
fn prefer_env(env: Option<String>, configured: Option<&str>) -> Option<String> {
    env.and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
    .or_else(|| {
        configured
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TG_FILE_SHARE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".tg-file-share").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
