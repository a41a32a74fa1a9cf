//! Whole-store backup and restore.
//!
//! A backup is one JSON object with a member per store key, named by the
//! full namespaced key (`autoSalesManager_invoices`, ...). Missing keys are
//! written out with their defaults so every backup is complete.

use super::DealerService;
use crate::backend::StoreBackend;
use crate::error::{Error, Result};
use crate::key::StoreKey;
use crate::models::{
    CompanyProfile, Customer, GeneralSettings, Invoice, InvoiceSettings, PurchaseEntry, StockItem,
};
use crate::repository::WriteBatch;
use crate::serialization::{to_pretty_text, to_store_text};
use crate::strategy::WriteStrategy;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Suggested file name for a backup taken at `now`.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(
///     dealer_ledger::service::backup_file_name(at),
///     "auto_sales_backup_20240309_140507.json"
/// );
/// ```
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("auto_sales_backup_{}.json", now.format("%Y%m%d_%H%M%S"))
}

impl<B: StoreBackend> DealerService<B> {
    /// Serialize all seven keys into one pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a stored value cannot be read or decoded.
    pub async fn backup(&self) -> Result<String> {
        let store = &self.inner.store;
        let mut bundle = Map::new();
        for key in StoreKey::ALL {
            let value = match key {
                StoreKey::Customers => to_value(&store.load_collection::<Customer>().await?)?,
                StoreKey::Purchases => {
                    to_value(&store.load_collection::<PurchaseEntry>().await?)?
                }
                StoreKey::Stock => to_value(&store.load_collection::<StockItem>().await?)?,
                StoreKey::Invoices => to_value(&store.load_collection::<Invoice>().await?)?,
                StoreKey::InvoiceSettings => to_value(&store.load_invoice_settings().await?)?,
                StoreKey::CompanyProfile => to_value(&store.load_company_profile().await?)?,
                StoreKey::GeneralSettings => to_value(&store.load_general_settings().await?)?,
            };
            bundle.insert(store.keys().build(key), value);
        }

        let text = to_pretty_text(&bundle)?;
        info!("✓ Backup created ({} bytes)", text.len());
        Ok(text)
    }

    /// Replace all seven keys with the contents of a backup.
    ///
    /// The whole bundle is checked first: it must be a JSON object holding
    /// every key, and each value must decode as its record type. Nothing is
    /// written unless all checks pass. The writes always commit with
    /// [`WriteStrategy::Rollback`], whatever the service is configured with,
    /// so a rejected write puts every key back as it was.
    ///
    /// # Errors
    ///
    /// Returns `Error::RestoreError` for an incomplete or malformed bundle,
    /// or a storage error if a write is rejected.
    pub async fn restore(&self, text: &str) -> Result<()> {
        let store = &self.inner.store;
        let bundle: Map<String, Value> = serde_json::from_str(text).map_err(|e| {
            warn!("Restore aborted: backup is not a JSON object ({})", e);
            Error::RestoreError(format!("invalid backup file: {}", e))
        })?;

        let mut batch = WriteBatch::new();
        for key in StoreKey::ALL {
            let name = store.keys().build(key);
            let value = bundle.get(&name).ok_or_else(|| {
                warn!("Restore aborted: {} is missing", name);
                Error::RestoreError(format!("backup is missing {}", name))
            })?;
            match key {
                StoreKey::Customers => check::<Vec<Customer>>(&name, value)?,
                StoreKey::Purchases => check::<Vec<PurchaseEntry>>(&name, value)?,
                StoreKey::Stock => check::<Vec<StockItem>>(&name, value)?,
                StoreKey::Invoices => check::<Vec<Invoice>>(&name, value)?,
                StoreKey::InvoiceSettings => check::<InvoiceSettings>(&name, value)?,
                StoreKey::CompanyProfile => check::<Option<CompanyProfile>>(&name, value)?,
                StoreKey::GeneralSettings => check::<GeneralSettings>(&name, value)?,
            }
            batch.put_text(key, to_store_text(value)?);
        }

        store.commit(batch, WriteStrategy::Rollback).await?;
        info!("✓ Restored {} keys from backup", StoreKey::ALL.len());
        Ok(())
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::SerializationError(e.to_string()))
}

fn check<T: DeserializeOwned>(name: &str, value: &Value) -> Result<()> {
    serde_json::from_value::<T>(value.clone()).map(drop).map_err(|e| {
        warn!("Restore aborted: {} is malformed ({})", name, e);
        Error::RestoreError(format!("{}: {}", name, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::fixtures::{company, customer_form};

    #[tokio::test]
    async fn test_backup_of_empty_store_has_defaults() {
        let ledger = DealerService::new(InMemoryBackend::new());
        let text = ledger.backup().await.expect("Failed to back up");
        let bundle: Map<String, Value> = serde_json::from_str(&text).unwrap();

        assert_eq!(bundle.len(), 7);
        assert_eq!(bundle["autoSalesManager_customers"], Value::Array(vec![]));
        assert_eq!(bundle["autoSalesManager_companyProfile"], Value::Null);
        assert_eq!(
            bundle["autoSalesManager_settings"]["registeredPrefix"],
            Value::String("REG-INV-".into())
        );
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let source = DealerService::new(InMemoryBackend::new());
        source
            .create_customer(customer_form("Bihar"))
            .await
            .expect("Failed to create customer");
        source
            .save_company_profile(&company("Bihar"))
            .await
            .expect("Failed to save profile");
        let text = source.backup().await.expect("Failed to back up");

        let target = DealerService::new(InMemoryBackend::new());
        target.restore(&text).await.expect("Failed to restore");

        assert_eq!(
            target.list_customers().await.expect("Failed to list"),
            source.list_customers().await.expect("Failed to list")
        );
        assert_eq!(
            target.get_company_profile().await.expect("Failed to load"),
            Some(company("Bihar"))
        );
    }

    #[tokio::test]
    async fn test_restore_missing_key_writes_nothing() {
        let backend = InMemoryBackend::new();
        let ledger = DealerService::new(backend.clone());
        let mut bundle: Map<String, Value> =
            serde_json::from_str(&ledger.backup().await.expect("Failed to back up")).unwrap();
        bundle.remove("autoSalesManager_stock");

        let result = ledger
            .restore(&serde_json::to_string(&bundle).unwrap())
            .await;
        assert!(matches!(result, Err(Error::RestoreError(_))));
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_restore_rejects_malformed_value() {
        let backend = InMemoryBackend::new();
        let ledger = DealerService::new(backend.clone());
        let mut bundle: Map<String, Value> =
            serde_json::from_str(&ledger.backup().await.expect("Failed to back up")).unwrap();
        bundle.insert("autoSalesManager_invoices".into(), Value::String("oops".into()));

        let result = ledger
            .restore(&serde_json::to_string(&bundle).unwrap())
            .await;
        assert!(matches!(result, Err(Error::RestoreError(_))));
        assert!(backend.is_empty().await);

        assert!(matches!(ledger.restore("[1, 2]").await, Err(Error::RestoreError(_))));
    }
}
