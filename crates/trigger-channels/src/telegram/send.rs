//! Message sending and command registration.

use super::types::{TgResponse, TgUser};
use super::{TelegramChannel, MAX_MESSAGE_LEN};
use crate::utils::split_message;
use tracing::{info, warn};
use trigger_core::error::TriggerError;

impl TelegramChannel {
    /// Send a plain-text message to a specific chat.
    ///
    /// Replies are user-defined text, so no parse mode is set.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TriggerError> {
        let url = format!("{}/sendMessage", self.base_url);

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| TriggerError::Channel(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(TriggerError::Channel(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands = serde_json::json!({
            "commands": [
                { "command": "help", "description": "Show available commands" },
                { "command": "addtrigger", "description": "Add or update a trigger: keyword | reply" },
                { "command": "removetrigger", "description": "Remove a trigger by keyword" },
                { "command": "listtriggers", "description": "List all triggers" },
            ]
        });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&commands).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }

    /// Ask Telegram who we are and remember the username.
    /// Best-effort: without it, `/cmd@name` is accepted for any name.
    pub(crate) async fn fetch_username(&self) {
        let url = format!("{}/getMe", self.base_url);
        let me: Result<TgResponse<TgUser>, String> = match self.client.get(&url).send().await {
            Ok(resp) => resp.json().await.map_err(|e| format!("parse error: {e}")),
            Err(e) => Err(e.to_string()),
        };
        match me {
            Ok(TgResponse {
                result: Some(TgUser {
                    username: Some(name),
                    ..
                }),
                ..
            }) => {
                info!("Telegram bot username: @{name}");
                let _ = self.username.set(name);
            }
            Ok(resp) => warn!(
                "getMe returned no username: {}",
                resp.description.unwrap_or_default()
            ),
            Err(e) => warn!("getMe failed: {e}"),
        }
    }
}
