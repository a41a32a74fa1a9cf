//! Store key management.

use std::fmt;

/// Default namespace every key is stored under.
pub const DEFAULT_NAMESPACE: &str = "autoSalesManager";

/// The seven values the ledger persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Customers,
    Purchases,
    Stock,
    Invoices,
    InvoiceSettings,
    CompanyProfile,
    GeneralSettings,
}

impl StoreKey {
    /// Every key, in backup order.
    pub const ALL: [StoreKey; 7] = [
        StoreKey::Customers,
        StoreKey::Purchases,
        StoreKey::Stock,
        StoreKey::Invoices,
        StoreKey::InvoiceSettings,
        StoreKey::CompanyProfile,
        StoreKey::GeneralSettings,
    ];

    /// Stable suffix used in the persisted key name.
    pub fn suffix(&self) -> &'static str {
        match self {
            StoreKey::Customers => "customers",
            StoreKey::Purchases => "purchases",
            StoreKey::Stock => "stock",
            StoreKey::Invoices => "invoices",
            // historical name, kept so existing data still loads
            StoreKey::InvoiceSettings => "settings",
            StoreKey::CompanyProfile => "companyProfile",
            StoreKey::GeneralSettings => "generalSettings",
        }
    }

    /// Whether the key holds a record collection (defaults to `[]`).
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            StoreKey::Customers | StoreKey::Purchases | StoreKey::Stock | StoreKey::Invoices
        )
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Builds namespaced store keys.
#[derive(Clone, Debug)]
pub struct KeyBuilder {
    namespace: String,
}

impl KeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        KeyBuilder {
            namespace: namespace.into(),
        }
    }

    /// Build the full key: `"{namespace}_{suffix}"`, or the bare suffix
    /// when the namespace is empty.
    pub fn build(&self, key: StoreKey) -> String {
        if self.namespace.is_empty() {
            key.suffix().to_string()
        } else {
            format!("{}_{}", self.namespace, key.suffix())
        }
    }

    /// Resolve a full key back to a `StoreKey`.
    pub fn parse(&self, full: &str) -> Option<StoreKey> {
        StoreKey::ALL.into_iter().find(|k| self.build(*k) == full)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
