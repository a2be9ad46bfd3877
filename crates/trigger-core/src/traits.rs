use crate::{
    error::TriggerError,
    message::{IncomingMessage, OutgoingMessage},
    trigger::Trigger,
};
use async_trait::async_trait;

/// Trigger persistence, the source of truth.
///
/// Every backend (in-memory map, JSON file, SQLite) implements this trait
/// with the same semantics: keys are already normalized, `upsert` replaces
/// any record with the same key atomically, and removing an absent key is
/// not an error.
#[async_trait]
pub trait TriggerStore: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Return the full current contents.
    async fn load(&self) -> Result<Vec<Trigger>, TriggerError>;

    /// Insert the trigger, or replace the one with the same key.
    async fn upsert(&self, trigger: &Trigger) -> Result<(), TriggerError>;

    /// Delete the trigger for `key`. Returns `true` if one was deleted.
    async fn remove(&self, key: &str) -> Result<bool, TriggerError>;

    /// Whether a trigger exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool, TriggerError>;
}

/// Messaging Channel trait.
///
/// Every messaging platform implements this trait to receive and send
/// messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, TriggerError>;

    /// The bot's own handle on this platform, once known.
    fn bot_username(&self) -> Option<String> {
        None
    }

    /// Send a message back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), TriggerError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), TriggerError>;
}
