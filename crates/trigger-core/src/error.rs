use thiserror::Error;

/// Top-level error type for the trigger bot.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Malformed admin input (missing delimiter, empty keyword or reply).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Store backend unreachable or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Actor may not run a privileged command.
    #[error("not authorized")]
    Unauthorized,

    /// Command issued from a chat where it is not accepted.
    #[error("not allowed in this chat")]
    OutOfScope,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TriggerError {
    /// Whether the caller may retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Io(_))
    }
}
