//! Core record trait implemented by every persisted collection element.

use crate::key::StoreKey;
use serde::{Deserialize, Serialize};

/// Trait for records stored in one of the four collections.
///
/// # Example
///
/// ```
/// use dealer_ledger::entity::Record;
/// use dealer_ledger::key::StoreKey;
/// use dealer_ledger::models::Customer;
///
/// assert_eq!(Customer::collection(), StoreKey::Customers);
/// ```
pub trait Record: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone {
    /// Return the record's identity.
    fn record_id(&self) -> &str;

    /// Return the collection the record lives in.
    fn collection() -> StoreKey;

    /// Human-readable record kind for error messages.
    fn kind() -> &'static str;
}

/// Find a record by id in a loaded collection.
pub fn find<'a, T: Record>(records: &'a [T], id: &str) -> Option<&'a T> {
    records.iter().find(|r| r.record_id() == id)
}

/// Position of a record by id in a loaded collection.
pub fn position<T: Record>(records: &[T], id: &str) -> Option<usize> {
    records.iter().position(|r| r.record_id() == id)
}

/// Generate a fresh record identity.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
