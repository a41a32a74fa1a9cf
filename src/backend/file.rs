//! File-backed store: one JSON file per key under a directory.
//!
//! Writes go to a temporary sibling and are renamed into place, so a crash
//! mid-write leaves the previous value readable.

use super::{StoreBackend, CHANGE_CHANNEL_CAPACITY};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Durable store rooted at a directory.
#[derive(Clone)]
pub struct FileBackend {
    root: Arc<PathBuf>,
    changes: broadcast::Sender<String>,
}

impl FileBackend {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns `Err(Error::StorageError)` if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        info!("✓ File store opened at {}", root.display());

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(FileBackend {
            root: Arc::new(root),
            changes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::ValidationError(format!(
                "store key {:?} is not a valid file name",
                key
            )));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl StoreBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                debug!("✓ File GET {} -> HIT", key);
                Ok(Some(text))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("✓ File GET {} -> MISS", key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, value.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("✓ File SET {}", key);
        let _ = self.changes.send(key.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!("✓ File DELETE {}", key);
        let _ = self.changes.send(key.to_string());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(tokio::fs::metadata(self.root.as_path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn clear_all(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(self.root.as_path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path).await?;
            }
        }
        warn!("⚠ File CLEAR_ALL executed in {}", self.root.display());
        Ok(())
    }
}
