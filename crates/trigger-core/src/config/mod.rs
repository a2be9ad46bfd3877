mod channels;
mod defaults;

#[cfg(test)]
mod tests;

pub use channels::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TriggerError;
use crate::matcher::MatchMode;
use defaults::*;

/// Environment variable that fills an empty Telegram bot token.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable that overrides the SQLite database path.
pub const ENV_DB_PATH: &str = "TRIGGER_BOT_DB";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    /// File the settings were read from; `None` when defaults were used.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
        }
    }
}

impl BotConfig {
    /// Directory for rolling log files.
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand(&self.data_dir)).join("logs")
    }
}

/// Who may run admin commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether admin auth is enforced (default: true).
    /// When true, only users listed in `admins` may manage triggers;
    /// an empty list means nobody can.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Platform user IDs allowed to manage triggers.
    #[serde(default)]
    pub admins: Vec<i64>,
    /// Message sent to users who are not allowed to manage triggers.
    #[serde(default = "default_deny_message")]
    pub deny_message: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admins: Vec::new(),
            deny_message: default_deny_message(),
        }
    }
}

impl AuthConfig {
    /// Whether `sender_id` may run admin commands.
    pub fn is_admin(&self, sender_id: &str) -> bool {
        if !self.enabled {
            return true;
        }
        sender_id
            .parse::<i64>()
            .map(|id| self.admins.contains(&id))
            .unwrap_or(false)
    }
}

/// Trigger store backend selector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Ephemeral map, lost on restart.
    Memory,
    /// JSON file.
    File,
    /// SQLite database.
    #[default]
    Sqlite,
}

impl StoreBackend {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Trigger store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// JSON file used by the `file` backend.
    #[serde(default = "default_file_path")]
    pub path: String,
    /// Database used by the `sqlite` backend.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Upper bound for a single store call, in seconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
    /// Reload the registry from the store every N seconds. 0 = never.
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_file_path(),
            db_path: default_db_path(),
            timeout_secs: default_store_timeout(),
            refresh_interval_secs: 0,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Matching policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub mode: MatchMode,
}

/// Admin command behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Separator between keyword and reply in `/addtrigger`.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Accept triggers with an empty reply.
    #[serde(default)]
    pub allow_empty_reply: bool,
    /// Only accept admin commands in private chats.
    #[serde(default = "default_true")]
    pub private_only: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            allow_empty_reply: false,
            private_only: true,
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

impl Config {
    /// Fill in values from the environment via `lookup`.
    ///
    /// The bot token only fills an empty config value; the database path
    /// always wins over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_BOT_TOKEN).filter(|t| !t.is_empty()) {
            let tg = self
                .channel
                .telegram
                .get_or_insert_with(|| TelegramConfig {
                    enabled: true,
                    ..Default::default()
                });
            if tg.bot_token.is_empty() {
                tg.bot_token = token;
            }
        }
        if let Some(db) = lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            self.store.db_path = db;
        }
    }

    /// Reject settings that cannot work at runtime.
    pub fn validate(&self) -> Result<(), TriggerError> {
        if self.admin.delimiter.trim().is_empty() {
            return Err(TriggerError::Config(
                "admin.delimiter must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file, then apply environment overrides.
///
/// Falls back to defaults if the file does not exist; `Config::source`
/// records which happened so the caller can log it once logging is up.
pub fn load(path: &str) -> Result<Config, TriggerError> {
    let mut config = load_file(Path::new(path))?;
    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn load_file(path: &Path) -> Result<Config, TriggerError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| TriggerError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let mut config: Config = toml::from_str(&content)
        .map_err(|e| TriggerError::Config(format!("failed to parse config: {}", e)))?;
    config.source = Some(path.to_path_buf());

    Ok(config)
}
