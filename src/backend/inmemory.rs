//! In-memory store backend (default).
//!
//! Uses DashMap for concurrent access with per-key sharding. An optional
//! byte quota models the size limit of browser-style storage: a write that
//! would push the total past the quota is rejected and leaves the previous
//! value in place.

use super::{StoreBackend, CHANGE_CHANNEL_CAPACITY};
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Thread-safe async in-memory store backend.
///
/// # Example
///
/// ```no_run
/// use dealer_ledger::backend::{InMemoryBackend, StoreBackend};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::with_quota(5 * 1024 * 1024);
///
///     backend.set("autoSalesManager_stock", "[]".to_string()).await?;
///     let value = backend.get("autoSalesManager_stock").await?;
///     assert_eq!(value.as_deref(), Some("[]"));
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, String>>,
    quota_bytes: Option<usize>,
    changes: broadcast::Sender<String>,
}

impl InMemoryBackend {
    /// Create a new unbounded in-memory backend.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            quota_bytes: None,
            changes,
        }
    }

    /// Create a backend that rejects writes once the stored keys and values
    /// would exceed `bytes` in total.
    pub fn with_quota(bytes: usize) -> Self {
        InMemoryBackend {
            quota_bytes: Some(bytes),
            ..Self::new()
        }
    }

    /// Get the current number of keys.
    pub async fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> StoreStats {
        let total_bytes: usize = self
            .store
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum();

        StoreStats {
            total_entries: self.store.len(),
            total_bytes,
            quota_bytes: self.quota_bytes,
        }
    }

    /// Print store statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Store Stats: {} entries, {} bytes (quota: {:?})",
            stats.total_entries, stats.total_bytes, stats.quota_bytes
        );
    }

    fn usage_after_write(&self, key: &str, value: &str) -> usize {
        self.store
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum::<usize>()
            + key.len()
            + value.len()
    }

    fn notify(&self, key: &str) {
        // no receivers is fine
        let _ = self.changes.send(key.to_string());
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.store.get(key).map(|entry| entry.value().clone());
        debug!(
            "✓ InMemory GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.usage_after_write(key, &value);
            if needed > quota {
                warn!(
                    "⚠ InMemory SET {} rejected: {} bytes exceeds quota of {}",
                    key, needed, quota
                );
                return Err(Error::StorageError(format!(
                    "quota exceeded writing {}: {} > {} bytes",
                    key, needed, quota
                )));
            }
        }

        self.store.insert(key.to_string(), value);
        debug!("✓ InMemory SET {}", key);
        self.notify(key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        self.notify(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.contains_key(key))
    }

    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let results = keys
            .iter()
            .map(|k| self.store.get(*k).map(|entry| entry.value().clone()))
            .collect();

        debug!("✓ InMemory MGET {} keys", keys.len());
        Ok(results)
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }

    async fn clear_all(&self) -> Result<()> {
        let keys: Vec<String> = self.store.iter().map(|e| e.key().clone()).collect();
        self.store.clear();
        for key in &keys {
            self.notify(key);
        }
        warn!("⚠ InMemory CLEAR_ALL executed - all records removed!");
        Ok(())
    }
}

/// Store statistics.
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub total_entries: usize,
    pub total_bytes: usize,
    pub quota_bytes: Option<usize>,
}
