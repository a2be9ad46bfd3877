//! Ephemeral in-process backend.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use trigger_core::{error::TriggerError, traits::TriggerStore, Trigger};

/// Trigger store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    triggers: RwLock<HashMap<String, Trigger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TriggerStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<Vec<Trigger>, TriggerError> {
        Ok(self.triggers.read().await.values().cloned().collect())
    }

    async fn upsert(&self, trigger: &Trigger) -> Result<(), TriggerError> {
        self.triggers
            .write()
            .await
            .insert(trigger.key.clone(), trigger.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, TriggerError> {
        Ok(self.triggers.write().await.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, TriggerError> {
        Ok(self.triggers.read().await.contains_key(key))
    }
}
