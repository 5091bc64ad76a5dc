//! Configuration management for the search bot.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::{Error, Result};

/// Placeholder used when `BOT_TOKEN` is unset.
pub const BOT_TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";
/// Sentinel meaning "no API key configured".
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";
/// Default lookup endpoint.
pub const DEFAULT_API_URL: &str = "https://your-universal-api.com/search";
/// Default Bot API base.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,
    /// Lookup endpoint
    pub api_url: String,
    /// Lookup bearer token (may be the placeholder)
    pub api_key: String,
    /// Bot API base URL
    pub telegram_api_url: String,
    /// Timeout for one lookup request
    pub lookup_timeout: Duration,
    /// Long-poll timeout passed to `getUpdates`
    pub poll_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bot_token: var("BOT_TOKEN").unwrap_or_else(|| BOT_TOKEN_PLACEHOLDER.to_string()),
            api_url: var("API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: var("API_KEY")
                .map(|key| key.trim().to_string())
                .unwrap_or_else(|| API_KEY_PLACEHOLDER.to_string()),
            telegram_api_url: var("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            lookup_timeout: parse_secs(&var, "LOOKUP_TIMEOUT_SECS", 30)?,
            poll_timeout: parse_secs(&var, "POLL_TIMEOUT_SECS", 30)?,
        })
    }

    /// Fail when the bot token was never set.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() || self.bot_token == BOT_TOKEN_PLACEHOLDER {
            return Err(Error::Config("BOT_TOKEN not set".to_string()));
        }
        Ok(())
    }
}

fn parse_secs<F>(var: &F, name: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| Error::Config(format!("{} must be a whole number of seconds: {}", name, e))),
        None => Ok(Duration::from_secs(default)),
    }
}

/// Snapshot of the lookup endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_url: String,
    pub api_key: String,
}

impl ApiCredentials {
    /// True when the key is empty or still the placeholder.
    pub fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }
}

/// Lookup settings shared by every chat session.
///
/// Writes are last-writer-wins. A lookup reads one snapshot before it sends
/// and keeps that key even if `/setapi` replaces it mid-flight.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    inner: Arc<RwLock<ApiCredentials>>,
}

impl ApiSettings {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ApiCredentials {
                api_url: api_url.into(),
                api_key: api_key.into(),
            })),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone(), config.api_key.clone())
    }

    /// Current URL and key.
    pub async fn snapshot(&self) -> ApiCredentials {
        self.inner.read().await.clone()
    }

    /// Replace the API key.
    pub async fn set_api_key(&self, api_key: impl Into<String>) {
        self.inner.write().await.api_key = api_key.into();
    }
}

/// First four characters of a secret followed by an ellipsis, for logs.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}...", prefix)
}
