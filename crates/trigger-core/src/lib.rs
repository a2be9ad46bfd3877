//! # trigger-core
//!
//! Core types, matching engine, traits, configuration, and error handling
//! for the trigger bot.

pub mod config;
pub mod error;
pub mod matcher;
pub mod message;
pub mod traits;
pub mod trigger;

pub use config::shellexpand;
pub use matcher::{find_match, MatchMode};
pub use trigger::{normalize_key, Trigger, TriggerSet};
