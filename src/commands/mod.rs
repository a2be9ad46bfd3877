//! Bot commands and the admin command processor.
//!
//! `/addtrigger`, `/removetrigger` and `/listtriggers` are privileged and go
//! through [`AdminProcessor::execute`]. Callers that are not admins, or that
//! issue a command from a group when `admin.private_only` is set, always get
//! an explicit rejection and the store is never touched.


use std::sync::Arc;
use tracing::{error, warn};
use trigger_core::{config::AdminConfig, error::TriggerError, normalize_key, Trigger};
use trigger_store::{Registry, UpsertOutcome};

/// Reply to admin commands issued outside a private chat.
pub const PRIVATE_ONLY_MESSAGE: &str = "This command only works in private messages.";

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    AddTrigger,
    RemoveTrigger,
    ListTriggers,
}

impl Command {
    /// Parse a command from message text. Returns `None` for unknown `/` prefixes
    /// (which should pass through to matching).
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/help@trigger_bot" → "/help").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/addtrigger" => Some(Self::AddTrigger),
            "/removetrigger" => Some(Self::RemoveTrigger),
            "/listtriggers" => Some(Self::ListTriggers),
            _ => None,
        }
    }

    /// The admin operation behind this command, if it is privileged.
    pub fn admin_op(&self) -> Option<AdminOp> {
        match self {
            Self::AddTrigger => Some(AdminOp::Add),
            Self::RemoveTrigger => Some(AdminOp::Remove),
            Self::ListTriggers => Some(AdminOp::List),
            Self::Start | Self::Help => None,
        }
    }
}

/// The `@botname` a command is addressed to (`/help@trigger_bot`), if any.
pub fn mention(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    first
        .split_once('@')
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
}

/// Everything after the command word, trimmed.
pub fn arguments(text: &str) -> &str {
    text.trim_start()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .unwrap_or("")
}

/// Help text listing the commands.
pub fn help_text(delimiter: &str) -> String {
    format!(
        "I reply automatically when a message contains one of my keywords.\n\
         Admin commands:\n\
         /addtrigger <keyword> {delimiter} <reply> - add or update a trigger\n\
         /removetrigger <keyword> - remove a trigger\n\
         /listtriggers - show all triggers"
    )
}

/// Privileged trigger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOp {
    Add,
    Remove,
    List,
}

impl AdminOp {
    fn command(&self) -> &'static str {
        match self {
            Self::Add => "/addtrigger",
            Self::Remove => "/removetrigger",
            Self::List => "/listtriggers",
        }
    }
}

/// Who is asking, as far as the processor cares.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub authorized: bool,
    pub private_chat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// Result of an admin command, ready to be sent back to the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminReply {
    pub status: ReplyStatus,
    pub message: String,
}

impl AdminReply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Ok,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}

/// Validates admin requests and applies them to the registry.
pub struct AdminProcessor {
    registry: Arc<Registry>,
    settings: AdminConfig,
    deny_message: String,
}

impl AdminProcessor {
    pub fn new(registry: Arc<Registry>, settings: AdminConfig, deny_message: String) -> Self {
        Self {
            registry,
            settings,
            deny_message,
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.settings.delimiter
    }

    /// Run `op` with `raw_args` on behalf of `actor`.
    pub async fn execute(&self, op: AdminOp, actor: &Actor, raw_args: &str) -> AdminReply {
        let result = match self.authorize(actor) {
            Err(e) => Err(e),
            Ok(()) => match op {
                AdminOp::Add => self.add(raw_args).await,
                AdminOp::Remove => self.remove(raw_args).await,
                AdminOp::List => Ok(self.list()),
            },
        };

        match result {
            Ok(message) => AdminReply::ok(message),
            Err(TriggerError::Validation(reason)) => {
                AdminReply::error(format!("{reason}\n{}", self.usage(op)))
            }
            Err(TriggerError::Unauthorized) => AdminReply::error(self.deny_message.clone()),
            Err(TriggerError::OutOfScope) => AdminReply::error(PRIVATE_ONLY_MESSAGE),
            Err(e) => {
                if e.is_retryable() {
                    warn!("{} failed: {e}", op.command());
                } else {
                    error!("{} failed: {e}", op.command());
                }
                AdminReply::error("Could not save the change right now. Please try again later.")
            }
        }
    }

    fn authorize(&self, actor: &Actor) -> Result<(), TriggerError> {
        if !actor.authorized {
            return Err(TriggerError::Unauthorized);
        }
        if self.settings.private_only && !actor.private_chat {
            return Err(TriggerError::OutOfScope);
        }
        Ok(())
    }

    /// Split `keyword <delimiter> reply` into a trigger.
    pub fn parse_add(&self, raw_args: &str) -> Result<Trigger, TriggerError> {
        let delimiter = self.settings.delimiter.as_str();
        let (keyword, reply) = raw_args.split_once(delimiter).ok_or_else(|| {
            TriggerError::Validation(format!("Separate the keyword and the reply with '{delimiter}'."))
        })?;

        let reply = reply.trim();
        if reply.is_empty() && !self.settings.allow_empty_reply {
            return Err(TriggerError::Validation(
                "The reply must not be empty.".to_string(),
            ));
        }
        Trigger::new(keyword, reply)
            .map_err(|_| TriggerError::Validation("The keyword must not be empty.".to_string()))
    }

    async fn add(&self, raw_args: &str) -> Result<String, TriggerError> {
        let trigger = self.parse_add(raw_args)?;
        let display = trigger.display.clone();
        let verb = match self.registry.upsert(trigger).await? {
            UpsertOutcome::Created => "added",
            UpsertOutcome::Replaced => "updated",
        };
        Ok(format!("Trigger '{display}' {verb}."))
    }

    async fn remove(&self, raw_args: &str) -> Result<String, TriggerError> {
        let keyword = raw_args.trim();
        let key = normalize_key(keyword);
        if key.is_empty() {
            return Err(TriggerError::Validation(
                "The keyword must not be empty.".to_string(),
            ));
        }
        if self.registry.remove(&key).await? {
            Ok(format!("Trigger '{keyword}' removed."))
        } else {
            Ok(format!("Trigger '{keyword}' not found."))
        }
    }

    fn list(&self) -> String {
        let triggers = self.registry.list();
        if triggers.is_empty() {
            return "No triggers yet.".to_string();
        }
        let lines: Vec<String> = triggers.iter().map(format_entry).collect();
        format!("Current triggers:\n{}", lines.join("\n"))
    }

    fn usage(&self, op: AdminOp) -> String {
        match op {
            AdminOp::Add => format!(
                "Usage: {} <keyword> {} <reply>",
                op.command(),
                self.settings.delimiter
            ),
            AdminOp::Remove => format!("Usage: {} <keyword>", op.command()),
            AdminOp::List => format!("Usage: {}", op.command()),
        }
    }
}

/// One listing line: `display → reply`.
pub fn format_entry(trigger: &Trigger) -> String {
    format!("{} → {}", trigger.display, trigger.reply)
}
