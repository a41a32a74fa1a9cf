//! High-level ledger service.
//!
//! [`DealerService`] is the single entry point front-ends use: invoice,
//! purchase and customer lifecycles, settings, listing, backup and change
//! subscriptions. Each operation loads the keys it needs, validates,
//! computes the new values in memory, then writes them through one
//! [`WriteBatch`] so nothing is written when validation fails.

mod backup;
mod customers;
mod invoices;
mod purchases;
mod settings;

pub use backup::backup_file_name;

use crate::backend::StoreBackend;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::key::KeyBuilder;
use crate::repository::{ChangeSubscription, RecordStore, WriteBatch};
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::sync::Arc;

/// Records manager for one dealership store.
///
/// Wraps its state in `Arc`, so clones are cheap and share the backend.
/// Operations assume a single logical writer: two clones saving at the same
/// time can interleave their read-modify-write cycles.
///
/// # Example
///
/// ```ignore
/// use dealer_ledger::{DealerService, backend::InMemoryBackend};
///
/// let ledger = DealerService::new(InMemoryBackend::new());
/// let party = ledger.create_customer(customer_form).await?;
/// let entry = ledger.create_purchase(purchase_form).await?;
/// let invoice = ledger.create_invoice(invoice_form).await?;
/// ```
#[derive(Clone)]
pub struct DealerService<B: StoreBackend> {
    inner: Arc<Inner<B>>,
}

struct Inner<B: StoreBackend> {
    store: RecordStore<B>,
    config: ServiceConfig,
}

impl<B: StoreBackend> DealerService<B> {
    /// Create a service with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ServiceConfig::default())
    }

    /// Create a service with custom configuration.
    pub fn with_config(backend: B, config: ServiceConfig) -> Self {
        let store = RecordStore::new(
            backend,
            KeyBuilder::new(config.namespace.clone()),
            config.metrics.clone(),
        );
        DealerService {
            inner: Arc::new(Inner { store, config }),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Typed store underneath the service.
    pub fn store(&self) -> &RecordStore<B> {
        &self.inner.store
    }

    /// Subscribe to changes of any of the seven keys.
    ///
    /// Intended for re-rendering views; the service never reads it.
    pub fn subscribe(&self) -> ChangeSubscription {
        self.inner.store.subscribe()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.inner
            .store
            .commit(batch, self.inner.config.write_strategy)
            .await
    }
}

/// Inclusive range of calendar days used to filter listings.
///
/// Dates are compared in each record's own UTC offset, so an invoice dated
/// `2024-05-01T00:30:00+05:30` falls on May 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// No bounds.
    pub fn all() -> Self {
        DateRange::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn since(start: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: NaiveDate) -> Self {
        DateRange {
            start: None,
            end: Some(end),
        }
    }

    pub fn contains(&self, at: &DateTime<FixedOffset>) -> bool {
        let day = at.date_naive();
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let may = DateRange::between(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        );
        assert!(may.contains(&at("2024-05-01T00:30:00+05:30")));
        assert!(may.contains(&at("2024-05-31T23:59:00+05:30")));
        assert!(!may.contains(&at("2024-06-01T00:00:00+05:30")));
        assert!(DateRange::all().contains(&at("1999-01-01T00:00:00Z")));
    }

    #[test]
    fn test_open_ended_ranges() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(DateRange::since(day).contains(&at("2024-05-10T08:00:00+05:30")));
        assert!(!DateRange::since(day).contains(&at("2024-05-09T08:00:00+05:30")));
        assert!(DateRange::until(day).contains(&at("2024-05-09T08:00:00+05:30")));
    }

    #[test]
    fn test_service_clone_shares_state() {
        let service1 = DealerService::new(InMemoryBackend::new());
        let service2 = service1.clone();

        assert!(Arc::ptr_eq(&service1.inner, &service2.inner));
        assert_eq!(service2.config().namespace, "autoSalesManager");
    }
}
