use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{FreightError, FreightResult};
use crate::models::EphemeralArtifacts;

/// Durable text key-value medium
pub trait DurableStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> FreightResult<Option<String>>;

    fn set(&self, key: &str, value: String) -> FreightResult<()>;

    fn remove(&self, key: &str) -> FreightResult<()>;

    /// All keys starting with `prefix`, sorted
    fn keys_with_prefix(&self, prefix: &str) -> FreightResult<Vec<String>>;
}

/// In-process store for artifacts that must not be persisted
pub trait EphemeralStore: Send + Sync + fmt::Debug {
    fn get(&self, order_id: i64) -> Option<EphemeralArtifacts>;

    fn set(&self, order_id: i64, artifacts: EphemeralArtifacts);

    fn remove(&self, order_id: i64);
}

#[derive(Debug, Default)]
pub struct InMemoryDurableStore {
    entries: DashMap<String, String>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DurableStore for InMemoryDurableStore {
    fn get(&self, key: &str) -> FreightResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> FreightResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> FreightResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> FreightResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Single JSON document on disk, rewritten on every change.
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// crash mid-write leaves the previous document intact.
pub struct FileDurableStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl fmt::Debug for FileDurableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDurableStore")
            .field("path", &self.path)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl FileDurableStore {
    /// Open (or create on first write) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> FreightResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    FreightError::StorageError(format!(
                        "Durable store {} is not valid JSON: {e}",
                        path.display()
                    ))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(
            path = %path.display(),
            entries = entries.len(),
            "Opened file durable store"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> FreightResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Failed to replace durable store file");
            FreightError::StorageError(e.to_string())
        })
    }
}

impl DurableStore for FileDurableStore {
    fn get(&self, key: &str) -> FreightResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> FreightResult<()> {
        let mut entries = self.entries.lock();
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.flush(&entries) {
            // Keep memory and disk in step
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> FreightResult<()> {
        let mut entries = self.entries.lock();
        if let Some(previous) = entries.remove(key) {
            if let Err(e) = self.flush(&entries) {
                entries.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> FreightResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryEphemeralStore {
    entries: DashMap<i64, EphemeralArtifacts>,
}

impl MemoryEphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EphemeralStore for MemoryEphemeralStore {
    fn get(&self, order_id: i64) -> Option<EphemeralArtifacts> {
        self.entries.get(&order_id).map(|entry| entry.value().clone())
    }

    fn set(&self, order_id: i64, artifacts: EphemeralArtifacts) {
        self.entries.insert(order_id, artifacts);
    }

    fn remove(&self, order_id: i64) {
        self.entries.remove(&order_id);
    }
}
