//! Telegram Bot API channel.
//!
//! Uses long polling via `getUpdates` and `sendMessage` for responses.
//! Docs: <https://core.telegram.org/bots/api>

mod polling;
mod send;
pub(crate) mod types;


use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use trigger_core::config::TelegramConfig;

/// Telegram's per-message character limit.
const MAX_MESSAGE_LEN: usize = 4096;

/// Telegram channel using the Bot API with long polling.
pub struct TelegramChannel {
    client: reqwest::Client,
    base_url: String,
    /// Tracks the last update_id to avoid reprocessing.
    last_update_id: Arc<Mutex<Option<i64>>>,
    /// Bot's own username, learned from `getMe` at start.
    username: OnceLock<String>,
}

impl TelegramChannel {
    /// Create a new Telegram channel from config.
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_base_url(format!("https://api.telegram.org/bot{}", config.bot_token))
    }

    /// Create a channel against a custom Bot API endpoint.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            last_update_id: Arc::new(Mutex::new(None)),
            username: OnceLock::new(),
        }
    }
}
