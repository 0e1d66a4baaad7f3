use crate::errors::{MediaRankError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw key -> serialized entry storage
pub trait CacheStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, payload: &str) -> Result<()>;
    /// Returns whether something was removed
    fn remove(&self, key: &str) -> Result<bool>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Process-lifetime store backed by a concurrent map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn write(&self, key: &str, payload: &str) -> Result<()> {
        self.data.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.data.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.iter().map(|entry| entry.key().clone()).collect())
    }
}

/// One JSON file per key, named by the key's md5 digest.
/// Entries must carry their own `key` field for `keys()` to list them.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

#[derive(Deserialize)]
struct StoredKey {
    key: String,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|e| {
            MediaRankError::Cache(format!(
                "Failed to create cache directory {}: {}",
                directory.display(),
                e
            ))
        })?;
        Ok(Self { directory })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{:x}.json", md5::compute(key.as_bytes())))
    }
}

impl CacheStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.entry_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediaRankError::Io(e)),
        }
    }

    fn write(&self, key: &str, payload: &str) -> Result<()> {
        let path = self.entry_path(key);
        // Concurrent writers never observe a half-written file
        let temp = self
            .directory
            .join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        std::fs::write(&temp, payload)?;
        if let Err(e) = std::fs::rename(&temp, &path) {
            let _ = std::fs::remove_file(&temp);
            return Err(MediaRankError::Io(e));
        }
        debug!("Cache file written: {}", path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MediaRankError::Io(e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable cache file {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<StoredKey>(&content) {
                Ok(stored) => keys.push(stored.key),
                Err(_) => warn!("Skipping foreign file in cache directory: {}", path.display()),
            }
        }
        keys.sort();
        Ok(keys)
    }
}
