//! # trigger-channels
//!
//! Messaging platform integrations for the trigger bot.

pub mod telegram;
pub mod utils;
