//! # trigger-store
//!
//! Trigger persistence backends (memory, JSON file, SQLite) and the
//! in-memory registry the match engine reads from.

pub mod registry;
pub mod store;

pub use registry::{Registry, UpsertOutcome};
pub use store::{open_store, FileStore, MemoryStore, SqliteStore};
