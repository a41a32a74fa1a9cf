//! Typed access to the store.
//!
//! [`RecordStore`] sits between the ledger services and a [`StoreBackend`].
//! It resolves [`StoreKey`]s to namespaced key names, encodes and decodes
//! JSON text, substitutes defaults for keys that were never written, and
//! applies multi-key writes under a [`WriteStrategy`].
//!
//! # Defaults
//!
//! | Key | Missing value reads as |
//! |-----|------------------------|
//! | customers, purchases, stock, invoices | `[]` |
//! | settings | `InvoiceSettings::default()` |
//! | companyProfile | `None` |
//! | generalSettings | `GeneralSettings::default()` |
//!
//! # Multi-key writes
//!
//! Encode everything first with [`WriteBatch::put`], then hand the batch to
//! [`RecordStore::commit`]. Encoding failures surface before the first write.
//!
//! ```ignore
//! let mut batch = WriteBatch::new();
//! batch.put(StoreKey::Invoices, &invoices)?;
//! batch.put(StoreKey::Stock, &stock)?;
//! store.commit(batch, WriteStrategy::Rollback).await?;
//! ```

use crate::backend::StoreBackend;
use crate::entity::Record;
use crate::error::Result;
use crate::key::{KeyBuilder, StoreKey};
use crate::models::{CompanyProfile, GeneralSettings, InvoiceSettings};
use crate::observability::LedgerMetrics;
use crate::serialization::{from_store_text, to_store_text};
use crate::strategy::WriteStrategy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Encoded values waiting to be written, in write order.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<(StoreKey, String)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch { writes: Vec::new() }
    }

    /// Encode `value` and queue it for `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the value cannot be encoded.
    pub fn put<T: Serialize + ?Sized>(&mut self, key: StoreKey, value: &T) -> Result<&mut Self> {
        self.writes.push((key, to_store_text(value)?));
        Ok(self)
    }

    /// Queue already encoded text for `key`.
    pub fn put_text(&mut self, key: StoreKey, text: String) -> &mut Self {
        self.writes.push((key, text));
        self
    }

    pub fn keys(&self) -> Vec<StoreKey> {
        self.writes.iter().map(|(k, _)| *k).collect()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Typed store over a backend.
#[derive(Clone)]
pub struct RecordStore<B: StoreBackend> {
    backend: B,
    keys: KeyBuilder,
    metrics: Arc<dyn LedgerMetrics>,
}

impl<B: StoreBackend> RecordStore<B> {
    pub fn new(backend: B, keys: KeyBuilder, metrics: Arc<dyn LedgerMetrics>) -> Self {
        RecordStore {
            backend,
            keys,
            metrics,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    /// Raw text under `key`, `None` if never written.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend cannot be read.
    pub async fn read_text(&self, key: StoreKey) -> Result<Option<String>> {
        let name = self.keys.build(key);
        let timer = Instant::now();
        match self.backend.get(&name).await {
            Ok(text) => {
                self.metrics.record_read(&name, timer.elapsed());
                Ok(text)
            }
            Err(e) => {
                self.metrics.record_error(&name, &e.to_string());
                Err(e)
            }
        }
    }

    /// Replace the text under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageError` if the backend rejects the write.
    pub async fn write_text(&self, key: StoreKey, text: String) -> Result<()> {
        let name = self.keys.build(key);
        let timer = Instant::now();
        match self.backend.set(&name, text).await {
            Ok(()) => {
                self.metrics.record_write(&name, timer.elapsed());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_error(&name, &e.to_string());
                Err(e)
            }
        }
    }

    /// Decode the value under `key`, or build a default if it was never
    /// written.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeserializationError` if the stored text does not
    /// decode as `T`.
    pub async fn load<T, F>(&self, key: StoreKey, default: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.read_text(key).await? {
            Some(text) => from_store_text(&self.keys.build(key), &text),
            None => Ok(default()),
        }
    }

    /// Load one of the four record collections.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend fails or the stored array is malformed.
    pub async fn load_collection<T: Record>(&self) -> Result<Vec<T>> {
        self.load(T::collection(), Vec::new).await
    }

    /// Encode and write a single value.
    ///
    /// # Errors
    ///
    /// Returns `Err` on encoding failure or a rejected write.
    pub async fn save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<()> {
        self.write_text(key, to_store_text(value)?).await
    }

    pub async fn load_invoice_settings(&self) -> Result<InvoiceSettings> {
        self.load(StoreKey::InvoiceSettings, InvoiceSettings::default)
            .await
    }

    /// `None` until a profile has been saved (or when `null` is stored).
    pub async fn load_company_profile(&self) -> Result<Option<CompanyProfile>> {
        self.load(StoreKey::CompanyProfile, || None).await
    }

    pub async fn load_general_settings(&self) -> Result<GeneralSettings> {
        self.load(StoreKey::GeneralSettings, GeneralSettings::default)
            .await
    }

    /// Write every queued value in order.
    ///
    /// Under [`WriteStrategy::Rollback`], the text each key held before this
    /// call is captured first; if a write fails, keys already written are put
    /// back (or removed, if they did not exist) in reverse order before the
    /// original error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    pub async fn commit(&self, batch: WriteBatch, strategy: WriteStrategy) -> Result<()> {
        let mut written: Vec<(StoreKey, Option<String>)> = Vec::with_capacity(batch.len());
        for (key, text) in batch.writes {
            let previous = if strategy.rolls_back() {
                self.read_text(key).await?
            } else {
                None
            };
            if let Err(e) = self.write_text(key, text).await {
                if strategy.rolls_back() && !written.is_empty() {
                    self.undo(written).await;
                }
                return Err(e);
            }
            written.push((key, previous));
        }
        Ok(())
    }

    async fn undo(&self, written: Vec<(StoreKey, Option<String>)>) {
        let names: Vec<String> = written.iter().map(|(k, _)| self.keys.build(*k)).collect();
        self.metrics.record_rollback(&names);
        for (key, previous) in written.into_iter().rev() {
            let name = self.keys.build(key);
            let restored = match previous {
                Some(text) => self.backend.set(&name, text).await,
                None => self.backend.delete(&name).await,
            };
            if let Err(e) = restored {
                error!("Rollback of {} failed: {}", name, e);
            }
        }
    }

    /// Subscribe to changes of this store's keys.
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.backend.subscribe(),
            keys: self.keys.clone(),
        }
    }
}

/// Receiver of changed [`StoreKey`]s.
///
/// Keys outside this store's namespace are skipped.
pub struct ChangeSubscription {
    rx: broadcast::Receiver<String>,
    keys: KeyBuilder,
}

impl ChangeSubscription {
    /// Wait for the next change. Returns `None` once the backend is dropped.
    ///
    /// A receiver that falls behind skips the notifications it missed.
    pub async fn recv(&mut self) -> Option<StoreKey> {
        loop {
            match self.rx.recv().await {
                Ok(name) => {
                    if let Some(key) = self.keys.parse(&name) {
                        return Some(key);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Change subscriber lagged, {} notifications dropped", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next change if one is already queued.
    pub fn try_recv(&mut self) -> Option<StoreKey> {
        loop {
            match self.rx.try_recv() {
                Ok(name) => {
                    if let Some(key) = self.keys.parse(&name) {
                        return Some(key);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!("Change subscriber lagged, {} notifications dropped", missed);
                }
                Err(_) => return None,
            }
        }
    }
}
