//! Purchase entries and the stock they produce.

use super::{DateRange, DealerService};
use crate::backend::StoreBackend;
use crate::entity::{self, new_id, Record};
use crate::error::{Error, Result};
use crate::key::StoreKey;
use crate::ledger;
use crate::models::{AgedStockItem, Customer, PurchaseEntry, PurchaseForm, StockItem};
use crate::repository::WriteBatch;
use crate::serial;
use chrono::{DateTime, Utc};

impl<B: StoreBackend> DealerService<B> {
    /// Purchase entries dated within `range`, in stored order.
    pub async fn list_purchases(&self, range: &DateRange) -> Result<Vec<PurchaseEntry>> {
        let mut purchases: Vec<PurchaseEntry> = self.inner.store.load_collection().await?;
        purchases.retain(|p| range.contains(&p.invoice_date));
        Ok(purchases)
    }

    /// # Errors
    ///
    /// Returns `Error::NotFound` if no entry has this id.
    pub async fn get_purchase(&self, id: &str) -> Result<PurchaseEntry> {
        let purchases: Vec<PurchaseEntry> = self.inner.store.load_collection().await?;
        entity::find(&purchases, id)
            .cloned()
            .ok_or_else(|| Error::not_found(PurchaseEntry::kind(), id))
    }

    /// Every stock item, sold or not, in stored order.
    pub async fn list_stock(&self) -> Result<Vec<StockItem>> {
        self.inner.store.load_collection().await
    }

    /// Unsold items purchased within `range` and matching `term`, each with
    /// its age in days.
    ///
    /// `term` is matched against model, chassis, engine and colour; a blank
    /// term keeps everything.
    pub async fn list_stock_on_hand(
        &self,
        range: &DateRange,
        term: &str,
    ) -> Result<Vec<AgedStockItem>> {
        self.stock_on_hand_at(range, term, Utc::now()).await
    }

    async fn stock_on_hand_at(
        &self,
        range: &DateRange,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<AgedStockItem>> {
        let stock = self.list_stock().await?;
        let unsold: Vec<StockItem> = stock
            .into_iter()
            .filter(|s| !s.sold && range.contains(&s.purchase_date))
            .collect();
        Ok(ledger::search(&unsold, term)
            .into_iter()
            .map(|item| AgedStockItem {
                stock_in_days: ledger::days_in_stock(item, now),
                item: item.clone(),
            })
            .collect())
    }

    /// Record a purchase and add one unsold stock item per line.
    ///
    /// The serial is the caller's if given, otherwise the next `PUR-NNNNN`
    /// after the last stored entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` for a bad form, `Error::NotFound` for
    /// an unknown party, or a storage error.
    pub async fn create_purchase(&self, form: PurchaseForm) -> Result<PurchaseEntry> {
        form.validate()?;
        let party = self.get_customer(&form.party_id).await?;
        let store = &self.inner.store;
        let mut purchases: Vec<PurchaseEntry> = store.load_collection().await?;
        let mut stock: Vec<StockItem> = store.load_collection().await?;

        let serial_no = form
            .serial_no
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| {
                serial::next_purchase_serial(purchases.last().map(|p| p.serial_no.as_str()))
            });
        let now = Utc::now();
        let entry = build_entry(new_id(), serial_no, &party, form, now, now);

        purchases.push(entry.clone());
        ledger::materialize_from_purchase(&mut stock, &entry);
        self.write_purchases(purchases, stock).await?;

        info!(
            "✓ Purchase {} saved from {} ({} items)",
            entry.serial_no,
            entry.party_name,
            entry.items.len()
        );
        Ok(entry)
    }

    /// Replace a purchase entry's contents and regenerate its stock.
    ///
    /// The id, serial and creation time are kept. The entry's stock items are
    /// replaced by fresh unsold ones, so any sale against the old items is
    /// detached.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_purchase`], plus `Error::NotFound` for an
    /// unknown entry.
    pub async fn update_purchase(&self, id: &str, form: PurchaseForm) -> Result<PurchaseEntry> {
        form.validate()?;
        let store = &self.inner.store;
        let mut purchases: Vec<PurchaseEntry> = store.load_collection().await?;
        let index = entity::position(&purchases, id)
            .ok_or_else(|| Error::not_found(PurchaseEntry::kind(), id))?;
        let party = self.get_customer(&form.party_id).await?;
        let mut stock: Vec<StockItem> = store.load_collection().await?;

        let original = &purchases[index];
        let entry = build_entry(
            original.id.clone(),
            original.serial_no.clone(),
            &party,
            form,
            original.created_at,
            Utc::now(),
        );

        let sold = stock
            .iter()
            .filter(|s| s.purchase_entry_id == entry.id && s.sold)
            .count();
        if sold > 0 {
            warn!(
                "Purchase {} regenerated with {} sold items detached",
                entry.serial_no, sold
            );
        }

        purchases[index] = entry.clone();
        ledger::materialize_from_purchase(&mut stock, &entry);
        self.write_purchases(purchases, stock).await?;

        info!("✓ Purchase {} updated", entry.serial_no);
        Ok(entry)
    }

    /// Delete a purchase entry and every stock item it produced.
    ///
    /// Sold items are removed as well; invoices that listed them keep their
    /// lines but point at stock that no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id, or a storage error.
    pub async fn delete_purchase(&self, id: &str) -> Result<()> {
        let store = &self.inner.store;
        let mut purchases: Vec<PurchaseEntry> = store.load_collection().await?;
        let index = entity::position(&purchases, id)
            .ok_or_else(|| Error::not_found(PurchaseEntry::kind(), id))?;
        let mut stock: Vec<StockItem> = store.load_collection().await?;

        let entry = purchases.remove(index);
        let orphaned: Vec<&str> = stock
            .iter()
            .filter(|s| s.purchase_entry_id == entry.id && s.sold)
            .filter_map(|s| s.invoice_id.as_deref())
            .collect();
        if !orphaned.is_empty() {
            warn!(
                "Purchase {} deleted while sold to invoices {:?}",
                entry.serial_no, orphaned
            );
        }
        let removed = ledger::release_for_purchase(&mut stock, &entry.id);

        let mut batch = WriteBatch::new();
        batch
            .put(StoreKey::Stock, &stock)?
            .put(StoreKey::Purchases, &purchases)?;
        self.commit(batch).await?;

        info!(
            "✓ Purchase {} deleted with {} stock items",
            entry.serial_no, removed
        );
        Ok(())
    }

    async fn write_purchases(
        &self,
        purchases: Vec<PurchaseEntry>,
        stock: Vec<StockItem>,
    ) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch
            .put(StoreKey::Purchases, &purchases)?
            .put(StoreKey::Stock, &stock)?;
        self.commit(batch).await
    }
}

fn build_entry(
    id: String,
    serial_no: String,
    party: &Customer,
    form: PurchaseForm,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> PurchaseEntry {
    PurchaseEntry {
        id,
        serial_no,
        party_id: party.id.clone(),
        party_name: party.details.customer_name.clone(),
        customer_details: Some(party.snapshot()),
        invoice_no: form.invoice_no.trim().to_string(),
        invoice_date: form.invoice_date,
        items: form.items.into_iter().map(|i| i.into_item()).collect(),
        created_at,
        updated_at,
    }
}
