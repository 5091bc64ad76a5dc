//! Error types for the search bot.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside of the lookup path.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false`
    #[error("Telegram error {code}: {description}")]
    Telegram { code: i64, description: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome classes of a failed lookup.
///
/// Every variant is recovered at the lookup boundary and turned into a fixed
/// message for the user. Only `Unexpected` carries detail, and that detail
/// goes to the log, never to the chat.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("API key is not configured")]
    NotConfigured,

    #[error("request timed out")]
    Timeout,

    #[error("connection failed")]
    ConnectionFailure,

    #[error("API rejected the key")]
    Unauthorized,

    #[error("API quota exceeded")]
    QuotaExceeded,

    #[error("API returned HTTP {0}")]
    HttpFailure(u16),

    #[error("unexpected lookup failure: {0}")]
    Unexpected(String),
}

impl LookupError {
    /// Classify a `reqwest` failure. Timeouts win over connection errors.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else if err.is_connect() {
            LookupError::ConnectionFailure
        } else {
            LookupError::Unexpected(err.to_string())
        }
    }

    /// Map a non-200 status to its error class.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => LookupError::Unauthorized,
            402 => LookupError::QuotaExceeded,
            other => LookupError::HttpFailure(other),
        }
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::NotConfigured => {
                "❌ API not configured. Please set up your API key using /setapi command."
                    .to_string()
            }
            LookupError::Timeout => {
                "❌ Request timeout. The API is taking too long to respond.".to_string()
            }
            LookupError::ConnectionFailure => {
                "❌ Connection error. Please check your internet connection.".to_string()
            }
            LookupError::Unauthorized => {
                "❌ Invalid API key. Please check your API configuration using /setapi."
                    .to_string()
            }
            LookupError::QuotaExceeded => {
                "❌ API quota exceeded. Please upgrade your plan.".to_string()
            }
            LookupError::HttpFailure(code) => {
                format!("❌ API error: {}. Please try again later.", code)
            }
            LookupError::Unexpected(_) => {
                "❌ An error occurred while processing your request. Please try again later."
                    .to_string()
            }
        }
    }
}
