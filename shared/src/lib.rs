//! Shared library for the search bot.
//!
//! This crate provides the configuration, lookup client, response formatter,
//! conversation controller, per-chat dispatcher and Telegram transport used
//! by the bot binary.

pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod lookup;
pub mod models;
pub mod telegram;

#[cfg(test)]
mod testing;

pub use config::{ApiCredentials, ApiSettings, Config};
pub use conversation::{command_menu, Command, Controller, SessionState, SessionStore};
pub use dispatch::Dispatcher;
pub use error::{Error, LookupError, Result};
pub use format::format_response;
pub use lookup::LookupClient;
pub use models::{Entry, EntryType, SearchRequest, SearchResponse};
pub use telegram::{ChatId, ChatTransport, Reply, TelegramClient, Update};
