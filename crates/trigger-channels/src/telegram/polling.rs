//! Long-polling update loop and Channel trait implementation.

use super::types::{TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use trigger_core::{
    error::TriggerError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use uuid::Uuid;

const MAX_BACKOFF_SECS: u64 = 60;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, TriggerError> {
        self.fetch_username().await;
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let offset = last_update_id.lock().await.map(|id| id + 1);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let body: Result<TgResponse<Vec<TgUpdate>>, String> = match client
                    .get(&url)
                    .timeout(Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(resp) => resp.json().await.map_err(|e| format!("parse error: {e}")),
                    Err(e) => Err(format!("poll error: {e}")),
                };

                let updates = match body {
                    Ok(b) if b.ok => b.result.unwrap_or_default(),
                    Ok(b) => {
                        let reason = b.description.unwrap_or_default();
                        error!("telegram API error (retry in {backoff_secs}s): {reason}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        continue;
                    }
                    Err(e) => {
                        error!("telegram {e} (retry in {backoff_secs}s)");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        continue;
                    }
                };

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let Some(incoming) = to_incoming(update) else {
                        continue;
                    };
                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    fn bot_username(&self) -> Option<String> {
        self.username.get().cloned()
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), TriggerError> {
        let chat_id_str = message
            .reply_target
            .as_deref()
            .ok_or_else(|| TriggerError::Channel("no reply_target on outgoing message".into()))?;

        let chat_id: i64 = chat_id_str.parse().map_err(|e| {
            TriggerError::Channel(format!("invalid telegram chat_id '{chat_id_str}': {e}"))
        })?;

        self.send_text(chat_id, &message.text).await
    }

    async fn stop(&self) -> Result<(), TriggerError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

/// Convert an update into a text message, dropping everything else
/// (edits, media, service messages, other bots).
pub(super) fn to_incoming(update: TgUpdate) -> Option<IncomingMessage> {
    let msg = update.message?;
    let text = msg.text?;
    let user = msg.from?;

    if user.is_bot {
        debug!("telegram: ignoring message from bot {}", user.id);
        return None;
    }

    Some(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(user.display_name()),
        text,
        timestamp: chrono::Utc::now(),
        reply_target: Some(msg.chat.id.to_string()),
        is_group: !msg.chat.is_private(),
    })
}
