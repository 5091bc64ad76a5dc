//! Per-chat dialogue: command routing and the search / API-key conversations.
//!
//! Dispatch order for an incoming text is fixed: a recognized command first,
//! then whatever the chat's conversation is waiting for, and only then the
//! implicit search for freeform text. Each message reaches the lookup API at
//! most once.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::mask_secret;
use crate::lookup::LookupClient;
use crate::telegram::{BotCommand, ChatId, ChatTransport, Reply};
use crate::Result;

/// Longest wait for the typing indicator before the lookup goes ahead.
const TYPING_TIMEOUT: Duration = Duration::from_secs(2);

const WELCOME_TEXT: &str = "👋 Welcome to *Smarty Sunny Bot*\n\n\
🔍 Send your target number/email (e.g. +91********** or email@example.com)\n\
_I will search for leaked data if available._\n\n\
🔴 *Credit by Smart Sunny*";

const HELP_TEXT: &str = "🤖 Bot Commands:

/start - Start the bot
/help - Show this help message
/search - Start a new search
/setapi - Configure API key
/cancel - Cancel the current operation

🔍 Search Examples:
- example@gmail.com - Search by email
- +79001234567 - Search by phone number
- 127.0.0.1 - Search by IP address
- Petrov Ivan - Search by name
- O999МУ777 - Search by car number

📝 Note: You can also perform composite searches.";

const SEARCH_PROMPT: &str = "🔍 What would you like to search for?\n\n\
You can search for:\n\
• Emails (example@gmail.com)\n\
• Phone numbers (+79001234567)\n\
• IP addresses (127.0.0.1)\n\
• Names (Petrov Ivan)\n\
• Vehicle info (O999МУ777)\n\n\
Just type your search query:";

const API_KEY_PROMPT: &str = "Please enter your Universal API key:\n\n\
Format: YOUR_API_KEY\n\n\
You can get this key from your API provider.";

pub const API_KEY_INVALID: &str = "❌ Invalid API key. Please try again with /setapi.";
pub const API_KEY_SAVED: &str = "✅ API key updated successfully!\n\n\
You can now use the search features with your universal API.";
pub const CANCELLED: &str = "Operation cancelled.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel. Send a query or use /help.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Use /help to see what I can do.";

/// Where a chat's conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingSearch,
    AwaitingApiKey,
}

/// Conversation state keyed by chat.
///
/// Chats without an entry are `Idle`.
#[derive(Debug, Default)]
pub struct SessionStore {
    states: Mutex<HashMap<ChatId, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: ChatId) -> SessionState {
        self.lock().get(&chat_id).copied().unwrap_or_default()
    }

    pub fn set(&self, chat_id: ChatId, state: SessionState) {
        let mut states = self.lock();
        match state {
            SessionState::Idle => {
                states.remove(&chat_id);
            }
            other => {
                states.insert(chat_id, other);
            }
        }
    }

    /// Return the current state and reset the chat to `Idle` in one step.
    pub fn take(&self, chat_id: ChatId) -> SessionState {
        self.lock().remove(&chat_id).unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ChatId, SessionState>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Slash commands the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/search`, optionally with the query inline
    Search(Option<String>),
    SetApi,
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse `text` as a command.
    ///
    /// Returns `None` for freeform text and for commands addressed to a
    /// different bot (`/start@OtherBot`).
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (head, None),
        };

        if let (Some(target), Some(me)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(me) {
                return None;
            }
        }

        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "search" if args.is_empty() => Command::Search(None),
            "search" => Command::Search(Some(args.to_string())),
            "setapi" => Command::SetApi,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name.to_string()),
        };
        Some(command)
    }
}

/// Command menu registered with Telegram at startup.
pub fn command_menu() -> Vec<BotCommand> {
    [
        ("start", "Start the bot"),
        ("help", "Show this help message"),
        ("search", "Start a new search"),
        ("setapi", "Configure API key"),
        ("cancel", "Cancel the current operation"),
    ]
    .into_iter()
    .map(|(command, description)| BotCommand {
        command: command.to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// Routes incoming chat text to the right handler.
pub struct Controller<T> {
    transport: T,
    lookup: LookupClient,
    sessions: SessionStore,
    bot_username: Option<String>,
}

impl<T: ChatTransport> Controller<T> {
    pub fn new(transport: T, lookup: LookupClient) -> Self {
        Self {
            transport,
            lookup,
            sessions: SessionStore::new(),
            bot_username: None,
        }
    }

    /// Only accept `/cmd@name` commands addressed to this bot.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session_state(&self, chat_id: ChatId) -> SessionState {
        self.sessions.get(chat_id)
    }

    /// Handle one text message from `chat_id`.
    pub async fn handle_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        match Command::parse(text, self.bot_username.as_deref()) {
            Some(command) => self.handle_command(chat_id, command).await,
            None => self.handle_freeform(chat_id, text).await,
        }
    }

    async fn handle_command(&self, chat_id: ChatId, command: Command) -> Result<()> {
        info!("Processing command {:?} in chat {}", command, chat_id);

        match command {
            Command::Start => self.reply(chat_id, Reply::markdown(WELCOME_TEXT)).await,
            Command::Help => self.reply(chat_id, Reply::plain(HELP_TEXT)).await,
            Command::Search(Some(query)) => {
                self.sessions.set(chat_id, SessionState::Idle);
                self.run_search(chat_id, &query).await
            }
            Command::Search(None) => {
                self.sessions.set(chat_id, SessionState::AwaitingSearch);
                self.reply(chat_id, Reply::plain(SEARCH_PROMPT)).await
            }
            Command::SetApi => {
                self.sessions.set(chat_id, SessionState::AwaitingApiKey);
                self.reply(chat_id, Reply::plain(API_KEY_PROMPT)).await
            }
            Command::Cancel => {
                let reply = match self.sessions.take(chat_id) {
                    SessionState::Idle => Reply::plain(NOTHING_TO_CANCEL),
                    _ => Reply::plain(CANCELLED).removing_keyboard(),
                };
                self.reply(chat_id, reply).await
            }
            Command::Unknown(_) => self.reply(chat_id, Reply::plain(UNKNOWN_COMMAND)).await,
        }
    }

    async fn handle_freeform(&self, chat_id: ChatId, text: &str) -> Result<()> {
        match self.sessions.take(chat_id) {
            SessionState::AwaitingApiKey => self.save_api_key(chat_id, text).await,
            SessionState::AwaitingSearch | SessionState::Idle => {
                self.run_search(chat_id, text).await
            }
        }
    }

    async fn save_api_key(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let api_key = text.trim();
        if api_key.is_empty() {
            return self.reply(chat_id, Reply::plain(API_KEY_INVALID)).await;
        }

        self.lookup.settings().set_api_key(api_key).await;
        info!("Updated API key: {}", mask_secret(api_key));

        self.reply(chat_id, Reply::plain(API_KEY_SAVED)).await
    }

    async fn run_search(&self, chat_id: ChatId, query: &str) -> Result<()> {
        match tokio::time::timeout(TYPING_TIMEOUT, self.transport.send_typing(chat_id)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to send typing indicator to chat {}: {}", chat_id, e),
            Err(_) => warn!("Typing indicator for chat {} timed out", chat_id),
        }

        let text = self.lookup.lookup(query).await;
        self.reply(chat_id, Reply::plain(text)).await
    }

    async fn reply(&self, chat_id: ChatId, reply: Reply) -> Result<()> {
        self.transport.send_reply(chat_id, reply).await
    }
}
