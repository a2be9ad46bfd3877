//! JSON file backend.
//!
//! The file holds a sorted array of `{keyword, display, response}` records.
//! The older flat `{"keyword": "response"}` layout is still read; the next
//! write converts it. Every write goes to a sibling temp file that is then
//! renamed over the original, so readers see either the old or the new
//! contents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trigger_core::{error::TriggerError, shellexpand, traits::TriggerStore, Trigger};

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    keyword: String,
    #[serde(default)]
    display: String,
    response: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Layout {
    Records(Vec<Record>),
    Legacy(BTreeMap<String, String>),
}

/// Trigger store persisted as a single JSON file.
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, creating its parent directory.
    ///
    /// A missing file is an empty store. An existing file must parse.
    pub async fn open(path: &str) -> Result<Self, TriggerError> {
        let path = PathBuf::from(shellexpand(path));

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                TriggerError::StoreUnavailable(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };
        let count = store.read_all().await?.len();
        info!(
            "File trigger store at {} ({count} triggers)",
            store.path.display()
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Trigger>, TriggerError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(TriggerError::StoreUnavailable(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        parse(&content).map_err(|e| {
            TriggerError::StoreUnavailable(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    async fn write_all(&self, triggers: &BTreeMap<String, Trigger>) -> Result<(), TriggerError> {
        let records: Vec<Record> = triggers
            .values()
            .map(|t| Record {
                keyword: t.key.clone(),
                display: t.display.clone(),
                response: t.reply.clone(),
            })
            .collect();
        let json = serde_json::to_string_pretty(&records)?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json).await.map_err(|e| {
            TriggerError::StoreUnavailable(format!("failed to write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            TriggerError::StoreUnavailable(format!(
                "failed to replace {}: {e}",
                self.path.display()
            ))
        })?;
        debug!("wrote {} triggers to {}", records.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "triggers.json".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

/// Parse either file layout into triggers keyed by normalized keyword.
///
/// Only malformed JSON is an error. Records that do not form a valid
/// trigger (blank keyword) are skipped with a warning.
fn parse(content: &str) -> Result<BTreeMap<String, Trigger>, TriggerError> {
    let layout: Layout = serde_json::from_str(content)?;
    let pairs: Vec<(String, String, String)> = match layout {
        Layout::Records(records) => records
            .into_iter()
            .map(|r| (r.keyword, r.display, r.response))
            .collect(),
        Layout::Legacy(map) => map
            .into_iter()
            .map(|(k, v)| (k.clone(), k, v))
            .collect(),
    };

    let mut triggers = BTreeMap::new();
    for (keyword, display, response) in pairs {
        match Trigger::from_parts(&keyword, &display, &response) {
            Ok(trigger) => {
                triggers.insert(trigger.key.clone(), trigger);
            }
            Err(e) => warn!("skipping trigger record {keyword:?} -> {response:?}: {e}"),
        }
    }
    Ok(triggers)
}

#[async_trait]
impl TriggerStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<Vec<Trigger>, TriggerError> {
        Ok(self.read_all().await?.into_values().collect())
    }

    async fn upsert(&self, trigger: &Trigger) -> Result<(), TriggerError> {
        let _guard = self.write_lock.lock().await;
        let mut triggers = self.read_all().await?;
        if triggers.get(&trigger.key) == Some(trigger) {
            return Ok(());
        }
        triggers.insert(trigger.key.clone(), trigger.clone());
        self.write_all(&triggers).await
    }

    async fn remove(&self, key: &str) -> Result<bool, TriggerError> {
        let _guard = self.write_lock.lock().await;
        let mut triggers = self.read_all().await?;
        if triggers.remove(key).is_none() {
            return Ok(false);
        }
        self.write_all(&triggers).await?;
        Ok(true)
    }

    async fn exists(&self, key: &str) -> Result<bool, TriggerError> {
        Ok(self.read_all().await?.contains_key(key))
    }
}
