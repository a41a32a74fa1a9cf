//! Observability hooks for ledger operations.
//!
//! Implement [`LedgerMetrics`] to forward store timings and lifecycle events
//! to a monitoring system:
//!
//! ```ignore
//! use dealer_ledger::observability::LedgerMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl LedgerMetrics for PrometheusMetrics {
//!     fn record_write(&self, key: &str, duration: Duration) {
//!         // histogram!("ledger_write_seconds", "key" => key).record(duration);
//!     }
//! }
//!
//! // let config = ServiceConfig::default().with_metrics(Arc::new(PrometheusMetrics));
//! ```
//!
//! Methods not overridden log through the `log` crate. The default used by
//! [`crate::ServiceConfig`] is [`NoOpMetrics`], which records nothing.

use std::time::Duration;

/// Trait for ledger metrics collection.
pub trait LedgerMetrics: Send + Sync {
    /// Record a store read.
    fn record_read(&self, key: &str, duration: Duration) {
        debug!("Ledger READ: {} took {:?}", key, duration);
    }

    /// Record a store write.
    fn record_write(&self, key: &str, duration: Duration) {
        debug!("Ledger WRITE: {} took {:?}", key, duration);
    }

    /// Record a serial issued to a new invoice.
    fn record_serial_issued(&self, serial_no: &str, is_registered: bool) {
        debug!(
            "Ledger SERIAL: {} (registered: {})",
            serial_no, is_registered
        );
    }

    /// Record keys restored after a failed multi-key write.
    fn record_rollback(&self, keys: &[String]) {
        warn!("Ledger ROLLBACK: {:?}", keys);
    }

    /// Record a failed store operation.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Ledger ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl LedgerMetrics for NoOpMetrics {
    fn record_read(&self, _key: &str, _duration: Duration) {}
    fn record_write(&self, _key: &str, _duration: Duration) {}
    fn record_serial_issued(&self, _serial_no: &str, _is_registered: bool) {}
    fn record_rollback(&self, _keys: &[String]) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics that only log, using the trait's default methods.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl LedgerMetrics for LogMetrics {}
