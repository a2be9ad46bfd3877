//! Trigger store backends.
//!
//! Split into focused submodules:
//! - `memory`: ephemeral map, lost on restart
//! - `file`: JSON file with atomic replace-on-write
//! - `sqlite`: SQLite table with tracked migrations

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;
use tracing::info;
use trigger_core::{
    config::{StoreBackend, StoreConfig},
    error::TriggerError,
    traits::TriggerStore,
};

/// Open the backend selected by `config.backend`.
///
/// Errors here mean the store is unreachable at startup and should abort
/// the process.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn TriggerStore>, TriggerError> {
    let store: Arc<dyn TriggerStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::open(&config.path).await?),
        StoreBackend::Sqlite => Arc::new(SqliteStore::new(&config.db_path, config.timeout()).await?),
    };
    info!("Trigger store opened: {}", store.name());
    Ok(store)
}

#[cfg(test)]
mod tests;
