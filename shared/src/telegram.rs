//! Telegram Bot API client and the chat transport seam.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::{Error, Result};

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram chat identifier.
pub type ChatId = i64;

/// Outgoing chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Send with Markdown parse mode
    pub markdown: bool,
    /// Remove any custom reply keyboard
    pub remove_keyboard: bool,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
            remove_keyboard: false,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            markdown: true,
            ..Self::plain(text)
        }
    }

    pub fn removing_keyboard(mut self) -> Self {
        self.remove_keyboard = true;
        self
    }
}

/// Delivery side of the chat framework.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a message to a chat
    async fn send_reply(&self, chat_id: ChatId, reply: Reply) -> Result<()>;

    /// Show the "typing" indicator in a chat
    async fn send_typing(&self, chat_id: ChatId) -> Result<()>;
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

/// Incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Incoming message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

/// Chat a message belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// Message author or the bot itself.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

/// Entry in the bot's command menu.
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Client for the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    /// Create a client for `token` against `api_url` (normally `https://api.telegram.org`).
    pub fn new(http_client: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            http_client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.http_client.post(&url).json(&body).send().await?;
        let envelope: ApiEnvelope<T> = response.json().await?;

        if !envelope.ok {
            return Err(Error::Telegram {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope.description.unwrap_or_default(),
            });
        }

        envelope
            .result
            .ok_or_else(|| Error::Internal(format!("{} returned no result", method)))
    }

    /// Identity of the bot.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Register the command menu shown by Telegram clients.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let _: bool = self
            .call("setMyCommands", json!({ "commands": commands }))
            .await?;
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str, reply: &Reply) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if reply.markdown {
            body["parse_mode"] = json!("Markdown");
        }
        if reply.remove_keyboard {
            body["reply_markup"] = json!({ "remove_keyboard": true });
        }

        let _: serde_json::Value = self.call("sendMessage", body).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_reply(&self, chat_id: ChatId, reply: Reply) -> Result<()> {
        let chunks = split_message(&reply.text, MAX_MESSAGE_CHARS);
        debug!("Sending {} message part(s) to chat {}", chunks.len(), chat_id);
        for chunk in &chunks {
            self.send_message(chat_id, chunk, &reply).await?;
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        let _: bool = self
            .call(
                "sendChatAction",
                json!({ "chat_id": chat_id, "action": "typing" }),
            )
            .await?;
        Ok(())
    }
}

/// Split `text` into parts of at most `limit` characters, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            // Hard-split a single oversized line.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                parts.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
