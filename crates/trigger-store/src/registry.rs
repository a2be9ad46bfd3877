//! Trigger registry: the in-process mirror of the store.
//!
//! Readers take a cheap `Arc` snapshot and match against it without holding
//! any lock, so store I/O never stalls matching. Writers go through
//! [`Registry::upsert`] / [`Registry::remove`]: the store is written first
//! (bounded by a timeout) and the snapshot is updated only after the store
//! call succeeded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};
use trigger_core::{error::TriggerError, traits::TriggerStore, MatchMode, Trigger, TriggerSet};

/// Whether an upsert created a trigger or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

/// A committed store change to mirror in memory.
enum Mutation {
    Upsert(Trigger),
    Remove(String),
}

/// In-memory, read-optimized view of the trigger store.
pub struct Registry {
    store: Arc<dyn TriggerStore>,
    snapshot: RwLock<Arc<TriggerSet>>,
    /// Mutations hold it shared; `refresh` holds it exclusively so a reload
    /// cannot overwrite a newer mutation with older store contents.
    gate: tokio::sync::RwLock<()>,
    key_locks: KeyLocks,
    timeout: Duration,
}

impl Registry {
    /// Load the full store into a new registry.
    ///
    /// Fails if the store cannot be read; callers at startup should abort.
    pub async fn open(store: Arc<dyn TriggerStore>, timeout: Duration) -> Result<Self, TriggerError> {
        let registry = Self {
            store,
            snapshot: RwLock::new(Arc::new(TriggerSet::new())),
            gate: tokio::sync::RwLock::new(()),
            key_locks: KeyLocks::default(),
            timeout,
        };
        let count = registry.refresh().await?;
        info!(
            "Trigger registry loaded {count} triggers from {} store",
            registry.store.name()
        );
        Ok(registry)
    }

    /// Name of the backing store.
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Reload everything from the store. Returns the number of triggers.
    pub async fn refresh(&self) -> Result<usize, TriggerError> {
        let _gate = self.gate.write().await;
        let triggers = self.bounded("load", self.store.load()).await?;
        let set: TriggerSet = triggers.into_iter().collect();
        let count = set.len();
        *self.write_snapshot() = Arc::new(set);
        debug!("registry refreshed ({count} triggers)");
        Ok(count)
    }

    /// Current contents. Never waits on store I/O.
    pub fn snapshot(&self) -> Arc<TriggerSet> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reply of the trigger that fires for `text`, if any.
    pub fn find_reply(&self, text: &str, mode: MatchMode) -> Option<String> {
        self.snapshot()
            .find_match(text, mode)
            .map(|t| t.reply.clone())
    }

    /// All triggers, ordered lexicographically by key.
    pub fn list(&self) -> Vec<Trigger> {
        self.snapshot().sorted().into_iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Write `trigger` to the store, then mirror it.
    pub async fn upsert(&self, trigger: Trigger) -> Result<UpsertOutcome, TriggerError> {
        let _gate = self.gate.read().await;
        let _lease = self.key_locks.acquire(&trigger.key).await;

        // One deadline covers both store calls.
        let existed = self
            .bounded("upsert", async {
                let existed = self.store.exists(&trigger.key).await?;
                self.store.upsert(&trigger).await?;
                Ok(existed)
            })
            .await?;

        info!("trigger '{}' {}", trigger.key, if existed { "replaced" } else { "created" });
        self.apply(Mutation::Upsert(trigger));
        Ok(if existed {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Created
        })
    }

    /// Delete `key` from the store, then mirror it. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> Result<bool, TriggerError> {
        let _gate = self.gate.read().await;
        let _lease = self.key_locks.acquire(key).await;

        let removed = self.bounded("remove", self.store.remove(key)).await?;
        if removed {
            info!("trigger '{key}' removed");
        }
        // Applied even when the store had nothing, in case the mirror drifted.
        self.apply(Mutation::Remove(key.to_string()));
        Ok(removed)
    }

    /// The only place the snapshot changes outside of `refresh`.
    fn apply(&self, mutation: Mutation) {
        let mut guard = self.write_snapshot();
        let set = Arc::make_mut(&mut guard);
        match mutation {
            Mutation::Upsert(trigger) => {
                set.insert(trigger);
            }
            Mutation::Remove(key) => {
                set.remove(&key);
            }
        }
    }

    fn write_snapshot(&self) -> std::sync::RwLockWriteGuard<'_, Arc<TriggerSet>> {
        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a store call under the configured timeout.
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, TriggerError>
    where
        F: Future<Output = Result<T, TriggerError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(TriggerError::StoreUnavailable(format!(
                "{} {op} timed out after {:?}",
                self.store.name(),
                self.timeout
            ))),
        }
    }
}

/// Per-key async mutexes, dropped from the map once nobody holds them.
#[derive(Default)]
struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> KeyLease<'_> {
        let lock = self.map().entry(key.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        KeyLease {
            locks: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }
}

struct KeyLease<'a> {
    locks: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self.locks.map();
        if map
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.key);
        }
    }
}
