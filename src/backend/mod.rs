//! Store backend implementations.

use crate::error::Result;
use tokio::sync::broadcast;

#[cfg(feature = "file")]
pub mod file;
pub mod inmemory;

#[cfg(feature = "file")]
pub use file::FileBackend;
pub use inmemory::InMemoryBackend;

/// Capacity of the change-notification channel each backend owns.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Trait for durable key/value stores holding the ledger's JSON text.
///
/// Abstracts storage operations, allowing swappable backends.
/// Implementations: InMemory (default, optionally quota-limited), File.
///
/// Backends own no business logic. Values are opaque text; the typed layer in
/// [`crate::repository`] decides what they mean.
///
/// **IMPORTANT:** All methods use `&self`. Backends use interior mutability
/// so a cloned handle sees the same data.
#[allow(async_fn_in_trait)]
pub trait StoreBackend: Send + Sync + Clone {
    /// Retrieve the text stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Some(text))` - Value present
    /// - `Ok(None)` - Key never written (caller substitutes a default)
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be read
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store text under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Err(Error::StorageError)` if the write is rejected
    /// (quota exceeded, I/O failure). The previous value is left untouched.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove the value under `key`.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key has a value.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Bulk get operation.
    ///
    /// Default implementation calls `get()` for each key.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.get(key).await?);
        }
        Ok(results)
    }

    /// Subscribe to change notifications.
    ///
    /// Every successful `set` or `delete` publishes the full key name.
    /// Lagging receivers lose old notifications, never writes.
    fn subscribe(&self) -> broadcast::Receiver<String>;

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Optional: remove every key (use with caution).
    ///
    /// # Errors
    /// Returns `Err` if operation is not implemented or fails
    async fn clear_all(&self) -> Result<()> {
        Err(crate::error::Error::NotImplemented(
            "clear_all not implemented for this backend".to_string(),
        ))
    }
}
