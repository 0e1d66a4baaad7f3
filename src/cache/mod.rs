//! Result cache for enriched search results and per-item detail records.
//!
//! Keys are namespaced by provider and record kind and carry the entry format
//! version, so a video id can never collide with a series title and a format
//! change simply turns old entries into misses. Entries may expire after a
//! configurable time-to-live and can be invalidated one at a time, per
//! provider, or all at once.

pub mod store;

use crate::errors::Result;
use crate::providers::Provider;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use store::CacheStore;
use tracing::{debug, warn};

/// Bumped whenever a cached payload changes shape
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Namespaced, normalized cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a whole search result
    pub fn search(provider: Provider, term: &str) -> Self {
        Self::build(provider, "search", &normalize_term(term))
    }

    /// Key for one enriched child record
    pub fn item(provider: Provider, kind: &str, id: &str) -> Self {
        Self::build(provider, kind, id.trim())
    }

    fn build(provider: Provider, kind: &str, id: &str) -> Self {
        Self(format!(
            "v{}:{}:{}:{}",
            CACHE_FORMAT_VERSION,
            provider.namespace(),
            kind,
            id
        ))
    }

    /// Prefix shared by every key of one provider
    pub fn provider_prefix(provider: Provider) -> String {
        format!("v{}:{}:", CACHE_FORMAT_VERSION, provider.namespace())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim, collapse inner whitespace and lowercase a search term
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    key: String,
    stored_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    payload: serde_json::Value,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Typed cache over a raw [`CacheStore`]
pub struct ResultCache {
    store: Box<dyn CacheStore>,
    ttl: Option<Duration>,
}

impl ResultCache {
    pub fn new(store: Box<dyn CacheStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    /// Cached value for `key`, or `None` on a miss.
    /// Expired, outdated and unreadable entries count as misses and are dropped.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let Some(raw) = self.store.read(key.as_str())? else {
            debug!("Cache miss: {}", key);
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Dropping unreadable cache entry {}: {}", key, e);
                self.store.remove(key.as_str())?;
                return Ok(None);
            }
        };

        if entry.version != CACHE_FORMAT_VERSION || entry.key != key.as_str() {
            debug!("Dropping cache entry {} with version {}", key, entry.version);
            self.store.remove(key.as_str())?;
            return Ok(None);
        }

        if entry.is_expired(Utc::now()) {
            debug!("Cache entry expired: {}", key);
            self.store.remove(key.as_str())?;
            return Ok(None);
        }

        match serde_json::from_value(entry.payload) {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                Ok(Some(value))
            }
            Err(e) => {
                warn!("Dropping cache entry {} with unexpected shape: {}", key, e);
                self.store.remove(key.as_str())?;
                Ok(None)
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        let stored_at = Utc::now();
        // a lifetime past the representable range keeps the entry forever
        let expires_at = self
            .ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| stored_at.checked_add_signed(ttl));

        let entry = CacheEntry {
            version: CACHE_FORMAT_VERSION,
            key: key.as_str().to_string(),
            stored_at,
            expires_at,
            payload: serde_json::to_value(value)?,
        };
        self.store
            .write(key.as_str(), &serde_json::to_string(&entry)?)?;
        debug!("Cache stored: {}", key);
        Ok(())
    }

    pub fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        self.store.remove(key.as_str())
    }

    /// Remove every entry of one provider, or everything. Returns the count removed.
    pub fn clear(&self, provider: Option<Provider>) -> Result<usize> {
        let prefix = provider.map(CacheKey::provider_prefix);
        let mut removed = 0;
        for key in self.store.keys()? {
            let matches = prefix.as_deref().map_or(true, |p| key.starts_with(p));
            if matches && self.store.remove(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = self.store.keys()?;
        keys.sort();
        Ok(keys)
    }
}
