//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "trigger-bot".to_string()
}

pub fn default_data_dir() -> String {
    "~/.trigger-bot".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_deny_message() -> String {
    "Access denied. You are not allowed to manage triggers.".to_string()
}

pub fn default_file_path() -> String {
    "~/.trigger-bot/data/triggers.json".to_string()
}

pub fn default_db_path() -> String {
    "~/.trigger-bot/data/triggers.db".to_string()
}

pub fn default_store_timeout() -> u64 {
    5
}

pub fn default_delimiter() -> String {
    "|".to_string()
}
