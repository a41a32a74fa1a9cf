//! Stock ledger: the `sold`/`invoiceId` state of stock items.
//!
//! Each function takes the loaded stock collection and mutates it in place
//! (or returns a filtered view); persisting the result is the caller's job.
//! Every mutation stamps the touched item's `updatedAt`.

use crate::entity::new_id;
use crate::models::{Invoice, PurchaseEntry, StockItem};
use chrono::{DateTime, Utc};

/// Replace the stock produced by `purchase` with one fresh, unsold item per
/// purchase line.
///
/// Used on both create and update of a purchase: previous items for the
/// entry are dropped first, whatever their sold state.
pub fn materialize_from_purchase(stock: &mut Vec<StockItem>, purchase: &PurchaseEntry) {
    let removed = release_for_purchase(stock, &purchase.id);
    let now = Utc::now();
    stock.extend(purchase.items.iter().map(|item| StockItem {
        id: new_id(),
        purchase_entry_id: purchase.id.clone(),
        purchase_item_id: item.id.clone(),
        model_name: item.model_name.clone(),
        chassis_no: item.chassis_no.clone(),
        engine_no: item.engine_no.clone(),
        colour: item.colour.clone(),
        gst: item.gst,
        price: item.price,
        purchase_date: purchase.invoice_date,
        sold: false,
        invoice_id: None,
        created_at: now,
        updated_at: now,
    }));
    debug!(
        "✓ Ledger materialized {} items for purchase {} (replaced {})",
        purchase.items.len(),
        purchase.serial_no,
        removed
    );
}

/// Mark every listed item sold to `invoice_id`.
///
/// No check is made that an item is free; reserving an item already held by
/// another invoice moves it.
pub fn reserve(stock: &mut [StockItem], ids: &[String], invoice_id: &str) -> usize {
    let now = Utc::now();
    let mut touched = 0;
    for item in stock.iter_mut().filter(|s| ids.contains(&s.id)) {
        if item.sold && item.invoice_id.as_deref().is_some_and(|owner| owner != invoice_id) {
            warn!(
                "Stock {} moved from invoice {:?} to {}",
                item.chassis_no, item.invoice_id, invoice_id
            );
        }
        item.sold = true;
        item.invoice_id = Some(invoice_id.to_string());
        item.updated_at = now;
        touched += 1;
    }
    debug!("✓ Ledger reserved {} items to {}", touched, invoice_id);
    touched
}

/// Return listed items held by `invoice_id` to inventory.
///
/// Items owned by another invoice (or by none) are left alone.
pub fn release(stock: &mut [StockItem], ids: &[String], invoice_id: &str) -> usize {
    let now = Utc::now();
    let mut touched = 0;
    for item in stock.iter_mut().filter(|s| ids.contains(&s.id)) {
        if item.invoice_id.as_deref() != Some(invoice_id) {
            warn!(
                "Release of {} skipped: held by {:?}, not {}",
                item.chassis_no, item.invoice_id, invoice_id
            );
            continue;
        }
        item.sold = false;
        item.invoice_id = None;
        item.updated_at = now;
        touched += 1;
    }
    debug!("✓ Ledger released {} items from {}", touched, invoice_id);
    touched
}

/// Remove every item produced by the purchase entry, sold or not.
pub fn release_for_purchase(stock: &mut Vec<StockItem>, purchase_entry_id: &str) -> usize {
    let before = stock.len();
    stock.retain(|s| s.purchase_entry_id != purchase_entry_id);
    let removed = before - stock.len();
    if removed > 0 {
        debug!("✓ Ledger removed {} items of purchase {}", removed, purchase_entry_id);
    }
    removed
}

/// Items that can go on an invoice: everything unsold, plus whatever the
/// invoice being edited already holds.
pub fn list_available<'a>(stock: &'a [StockItem], editing: Option<&Invoice>) -> Vec<&'a StockItem> {
    stock
        .iter()
        .filter(|s| !s.sold || editing.is_some_and(|inv| s.is_held_by(&inv.id)))
        .collect()
}

/// Whole days between the item's purchase date and `now`, rounded toward
/// zero. A purchase dated in the future gives a negative count.
pub fn days_in_stock(item: &StockItem, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(item.purchase_date.with_timezone(&Utc))
        .num_days()
}

/// Items whose model, chassis, engine or colour contains `term`, ignoring
/// case. A blank term matches everything.
pub fn search<'a>(stock: &'a [StockItem], term: &str) -> Vec<&'a StockItem> {
    let needle = term.trim().to_lowercase();
    stock
        .iter()
        .filter(|s| {
            needle.is_empty()
                || [&s.model_name, &s.chassis_no, &s.engine_no, &s.colour]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}
