//! Search Bot - Telegram front end for the universal lookup API.
//!
//! Long-polls Telegram for updates, queues each message on its chat's
//! worker so one chat is handled in order while chats run concurrently, and
//! replies with formatted lookup results.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use shared::{
    command_menu, ApiSettings, Config, Controller, Dispatcher, LookupClient, TelegramClient,
    Update,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Application state
struct AppState {
    telegram: TelegramClient,
    dispatcher: Dispatcher<TelegramClient>,
    poll_timeout_secs: u64,
}

impl AppState {
    async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        // Long polls hold the connection open for `poll_timeout`, so the
        // shared client must not time out first.
        let http_client = reqwest::Client::builder()
            .timeout(config.poll_timeout + Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        let telegram =
            TelegramClient::new(http_client.clone(), &config.telegram_api_url, &config.bot_token);

        let me = telegram
            .get_me()
            .await
            .context("Failed to reach Telegram with BOT_TOKEN")?;
        info!(
            "Authorized as @{} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name
        );

        let settings = ApiSettings::from_config(&config);
        if !settings.snapshot().await.is_configured() {
            warn!("API_KEY not set; lookups are disabled until /setapi is used");
        }
        info!("Lookup endpoint: {}", config.api_url);

        let lookup = LookupClient::new(http_client, settings, config.lookup_timeout);
        let mut controller = Controller::new(telegram.clone(), lookup);
        if let Some(username) = me.username {
            controller = controller.with_bot_username(username);
        }

        Ok(Self {
            telegram,
            dispatcher: Dispatcher::new(controller),
            poll_timeout_secs: config.poll_timeout.as_secs(),
        })
    }
}

/// Queue one update on its chat's worker
fn handler(state: &AppState, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let Some(text) = message.text else {
        return;
    };

    state.dispatcher.dispatch(message.chat.id, text);
}

async fn poll(state: Arc<AppState>) {
    let mut offset = 0;

    loop {
        let updates = match state
            .telegram
            .get_updates(offset, state.poll_timeout_secs)
            .await
        {
            Ok(updates) => updates,
            Err(e) => {
                error!("Failed to fetch updates: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            handler(&state, update);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::new(config).await?);

    if let Err(e) = state.telegram.set_my_commands(&command_menu()).await {
        warn!("Failed to register command menu: {}", e);
    }

    info!("Bot started, polling for updates");
    tokio::select! {
        _ = poll(Arc::clone(&state)) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
