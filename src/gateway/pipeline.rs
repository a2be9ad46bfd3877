//! Message processing pipeline: command dispatch, then keyword matching.

use super::Gateway;
use crate::commands::{self, Actor, Command};
use tracing::{debug, info, warn};
use trigger_core::message::IncomingMessage;

impl Gateway {
    /// Process a single incoming message and send the reply, if any.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let preview = if incoming.text.chars().count() > 60 {
            let truncated: String = incoming.text.chars().take(60).collect();
            format!("{truncated}...")
        } else {
            incoming.text.clone()
        };
        info!(
            "[{}] {} says: {}",
            incoming.channel,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
            preview
        );

        match self.respond(&incoming).await {
            Some(reply) if !reply.is_empty() => self.send_text(&incoming, &reply).await,
            Some(_) => debug!("matched trigger has an empty reply, nothing to send"),
            None => {}
        }
    }

    /// Work out the reply for `incoming` without sending it.
    pub(super) async fn respond(&self, incoming: &IncomingMessage) -> Option<String> {
        let text = incoming.text.trim();

        if let Some(command) = Command::parse(text) {
            if !self.addressed_to_us(incoming, text) {
                debug!("ignoring command addressed to another bot: {text}");
                return None;
            }
            let Some(op) = command.admin_op() else {
                return Some(commands::help_text(self.admin.delimiter()));
            };

            let actor = Actor {
                authorized: self.auth_config.is_admin(&incoming.sender_id),
                private_chat: !incoming.is_group,
            };
            let reply = self
                .admin
                .execute(op, &actor, commands::arguments(text))
                .await;
            if !reply.is_ok() {
                warn!(
                    "admin command from {} on {} rejected: {}",
                    incoming.sender_id,
                    incoming.channel,
                    reply.message.lines().next().unwrap_or_default()
                );
            }
            return Some(reply.message);
        }

        if !self.chat_allowed(incoming) {
            debug!(
                "auto-replies disabled for chat {:?} on {}",
                incoming.reply_target, incoming.channel
            );
            return None;
        }

        self.registry.find_reply(&incoming.text, self.match_mode)
    }

    /// False when a command names a different bot with `@botname`.
    ///
    /// Until the channel knows its own username every mention is accepted.
    pub(super) fn addressed_to_us(&self, incoming: &IncomingMessage, text: &str) -> bool {
        let Some(target) = commands::mention(text) else {
            return true;
        };
        match self
            .channels
            .get(&incoming.channel)
            .and_then(|c| c.bot_username())
        {
            Some(own) => own.eq_ignore_ascii_case(target),
            None => true,
        }
    }

    /// Whether auto-replies are enabled in the chat `incoming` came from.
    pub(super) fn chat_allowed(&self, incoming: &IncomingMessage) -> bool {
        if incoming.channel != "telegram" {
            return true;
        }
        let Some(tg) = &self.channel_config.telegram else {
            return true;
        };
        match incoming
            .reply_target
            .as_deref()
            .and_then(|t| t.parse::<i64>().ok())
        {
            Some(chat_id) => tg.allows_chat(chat_id),
            None => tg.allowed_chats.is_empty(),
        }
    }
}
