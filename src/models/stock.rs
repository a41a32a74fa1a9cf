//! Stock items: one per physical vehicle unit.

use crate::entity::Record;
use crate::key::StoreKey;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A vehicle in inventory.
///
/// `sold` is true iff `invoice_id` names the saved invoice that lists this
/// item. The ledger keeps the two fields in step; nothing else writes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: String,
    pub purchase_entry_id: String,
    pub purchase_item_id: String,
    pub model_name: String,
    /// Globally unique; the natural key for duplicate detection.
    pub chassis_no: String,
    pub engine_no: String,
    pub colour: String,
    pub gst: f64,
    pub price: f64,
    pub purchase_date: DateTime<FixedOffset>,
    #[serde(default)]
    pub sold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Whether the item is reserved to `invoice_id`.
    pub fn is_held_by(&self, invoice_id: &str) -> bool {
        self.sold && self.invoice_id.as_deref() == Some(invoice_id)
    }
}

/// An unsold item with the number of whole days since it was purchased.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgedStockItem {
    #[serde(flatten)]
    pub item: StockItem,
    pub stock_in_days: i64,
}

impl Record for StockItem {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn collection() -> StoreKey {
        StoreKey::Stock
    }

    fn kind() -> &'static str {
        "stock item"
    }
}
