//! Service configuration.

use crate::key::DEFAULT_NAMESPACE;
use crate::observability::{LedgerMetrics, NoOpMetrics};
use crate::strategy::WriteStrategy;
use std::fmt;
use std::sync::Arc;

/// Setup-time configuration for [`crate::DealerService`].
///
/// # Example
///
/// ```
/// use dealer_ledger::{ServiceConfig, WriteStrategy};
///
/// let config = ServiceConfig::default()
///     .with_namespace("showroom2")
///     .with_write_strategy(WriteStrategy::Rollback);
///
/// assert_eq!(config.namespace, "showroom2");
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Prefix of every store key, `{namespace}_{key}`.
    ///
    /// Defaults to `autoSalesManager`, which keeps existing stores readable.
    pub namespace: String,

    /// Behaviour when a later write of a multi-key operation fails.
    pub write_strategy: WriteStrategy,

    /// Metrics sink for store timings and lifecycle events.
    pub metrics: Arc<dyn LedgerMetrics>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            namespace: DEFAULT_NAMESPACE.to_string(),
            write_strategy: WriteStrategy::default(),
            metrics: Arc::new(NoOpMetrics),
        }
    }
}

impl ServiceConfig {
    /// Store keys under a different namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Choose how failed multi-key writes are handled.
    ///
    /// ```ignore
    /// let config = ServiceConfig::default()
    ///     .with_write_strategy(WriteStrategy::Rollback);
    /// ```
    pub fn with_write_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.write_strategy = strategy;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn LedgerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("namespace", &self.namespace)
            .field("write_strategy", &self.write_strategy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::LogMetrics;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.namespace, "autoSalesManager");
        assert_eq!(config.write_strategy, WriteStrategy::BestEffort);
    }

    #[test]
    fn test_builder_chain() {
        let config = ServiceConfig::default()
            .with_namespace("branch2")
            .with_write_strategy(WriteStrategy::Rollback)
            .with_metrics(Arc::new(LogMetrics));

        assert_eq!(config.namespace, "branch2");
        assert!(config.write_strategy.rolls_back());
        assert!(format!("{:?}", config).contains("branch2"));
    }
}
