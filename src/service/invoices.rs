//! Invoice lifecycle: create, update, delete, and the reads around them.
//!
//! Serial numbers and stock reservations are the invariants here:
//!
//! - a serial is issued once, at creation, from the customer's branch;
//! - after any operation, exactly the items listed on a saved invoice are
//!   sold to it.

use super::{DateRange, DealerService};
use crate::backend::StoreBackend;
use crate::entity::{self, new_id, Record};
use crate::error::{Error, Result};
use crate::key::StoreKey;
use crate::ledger;
use crate::models::{
    CommercialFields, Customer, Invoice, InvoiceForm, InvoiceItem, InvoiceItemForm, StockItem,
};
use crate::repository::WriteBatch;
use crate::serial;
use chrono::Utc;
use std::collections::HashSet;

impl<B: StoreBackend> DealerService<B> {
    /// Invoices dated within `range`, newest first.
    pub async fn list_invoices(&self, range: &DateRange) -> Result<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.inner.store.load_collection().await?;
        invoices.retain(|inv| range.contains(&inv.invoice_date));
        invoices.sort_by(|a, b| b.invoice_date.cmp(&a.invoice_date));
        Ok(invoices)
    }

    /// # Errors
    ///
    /// Returns `Error::NotFound` if no invoice has this id.
    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        let invoices: Vec<Invoice> = self.inner.store.load_collection().await?;
        entity::find(&invoices, id)
            .cloned()
            .ok_or_else(|| Error::not_found(Invoice::kind(), id))
    }

    /// Serial the next invoice for this kind of party would receive.
    /// Nothing is reserved.
    pub async fn peek_next_invoice_serial(&self, is_registered: bool) -> Result<String> {
        let settings = self.inner.store.load_invoice_settings().await?;
        Ok(serial::peek_next_serial(is_registered, &settings))
    }

    /// Stock that can go on an invoice: unsold items, plus items already on
    /// the invoice being edited.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if `editing_invoice_id` names no invoice.
    pub async fn list_available_stock(
        &self,
        editing_invoice_id: Option<&str>,
    ) -> Result<Vec<StockItem>> {
        let stock: Vec<StockItem> = self.inner.store.load_collection().await?;
        let editing = match editing_invoice_id {
            Some(id) => Some(self.get_invoice(id).await?),
            None => None,
        };
        Ok(ledger::list_available(&stock, editing.as_ref())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Save a new invoice.
    ///
    /// Issues the next serial of the customer's branch, freezes the customer
    /// snapshot, sells every listed stock item to the invoice and advances
    /// the branch counter.
    ///
    /// For non-registered customers, blank bill type, RTO, nominee and sales
    /// person fields become `N/A`, a missing scheme becomes `Without Scheme`
    /// and a missing Aadhar number becomes empty.
    ///
    /// # Errors
    ///
    /// - `Error::ValidationError` for a malformed form, a chassis number
    ///   listed twice or an exhausted serial counter
    /// - `Error::NotFound` for an unknown customer or stock item
    /// - `Error::StorageError` if a write is rejected
    ///
    /// Nothing is written on validation or lookup failure.
    pub async fn create_invoice(&self, form: InvoiceForm) -> Result<Invoice> {
        let store = &self.inner.store;
        let settings = store.load_invoice_settings().await?;
        form.validate(settings.enable_aadhar_no)?;

        let customer = self.get_customer(&form.customer_id).await?;
        let mut stock: Vec<StockItem> = store.load_collection().await?;
        let mut invoices: Vec<Invoice> = store.load_collection().await?;
        let items = resolve_items(&form.items, &stock)?;

        let is_registered = customer.is_registered();
        let serial_no = serial::peek_next_serial(is_registered, &settings);
        let settings = serial::advance(is_registered, &settings)?;
        let now = Utc::now();
        let invoice = Invoice {
            id: new_id(),
            serial_no,
            customer_id: customer.id.clone(),
            customer_details: customer.snapshot(),
            invoice_date: form.invoice_date,
            items,
            commercial: commercial_for(&customer, form.commercial),
            created_at: now,
            updated_at: now,
        };

        invoices.push(invoice.clone());
        ledger::reserve(&mut stock, &invoice.stock_item_ids(), &invoice.id);

        let mut batch = WriteBatch::new();
        batch
            .put(StoreKey::Invoices, &invoices)?
            .put(StoreKey::Stock, &stock)?
            .put(StoreKey::InvoiceSettings, &settings)?;
        self.commit(batch).await?;

        self.inner
            .config
            .metrics
            .record_serial_issued(&invoice.serial_no, is_registered);
        info!(
            "✓ Invoice {} saved for {} ({} items)",
            invoice.serial_no,
            invoice.customer_details.customer_name,
            invoice.items.len()
        );
        Ok(invoice)
    }

    /// Replace an invoice's contents, keeping its id, serial and creation
    /// time.
    ///
    /// Every listed item is sold to the invoice; items dropped from the list
    /// are returned to inventory if the invoice still holds them. The serial
    /// counters do not move.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_invoice`], plus `Error::NotFound` for an
    /// unknown invoice id.
    pub async fn update_invoice(&self, invoice_id: &str, form: InvoiceForm) -> Result<Invoice> {
        let store = &self.inner.store;
        let settings = store.load_invoice_settings().await?;
        form.validate(settings.enable_aadhar_no)?;

        let mut invoices: Vec<Invoice> = store.load_collection().await?;
        let index = entity::position(&invoices, invoice_id)
            .ok_or_else(|| Error::not_found(Invoice::kind(), invoice_id))?;
        let customer = self.get_customer(&form.customer_id).await?;
        let mut stock: Vec<StockItem> = store.load_collection().await?;
        let items = resolve_items(&form.items, &stock)?;

        let original = &invoices[index];
        let invoice = Invoice {
            id: original.id.clone(),
            serial_no: original.serial_no.clone(),
            customer_id: customer.id.clone(),
            customer_details: customer.snapshot(),
            invoice_date: form.invoice_date,
            items,
            commercial: commercial_for(&customer, form.commercial),
            created_at: original.created_at,
            updated_at: Utc::now(),
        };

        let kept: HashSet<&str> = invoice
            .items
            .iter()
            .map(|i| i.stock_item_id.as_str())
            .collect();
        let dropped: Vec<String> = original
            .items
            .iter()
            .filter(|i| !kept.contains(i.stock_item_id.as_str()))
            .map(|i| i.stock_item_id.clone())
            .collect();

        ledger::reserve(&mut stock, &invoice.stock_item_ids(), &invoice.id);
        ledger::release(&mut stock, &dropped, &invoice.id);
        invoices[index] = invoice.clone();

        let mut batch = WriteBatch::new();
        batch
            .put(StoreKey::Invoices, &invoices)?
            .put(StoreKey::Stock, &stock)?;
        self.commit(batch).await?;

        info!(
            "✓ Invoice {} updated ({} items, {} released)",
            invoice.serial_no,
            invoice.items.len(),
            dropped.len()
        );
        Ok(invoice)
    }

    /// Delete an invoice and return its stock to inventory.
    ///
    /// The serial is not reused; counters never move backwards.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id, or a storage error.
    pub async fn delete_invoice(&self, invoice_id: &str) -> Result<()> {
        let store = &self.inner.store;
        let mut invoices: Vec<Invoice> = store.load_collection().await?;
        let index = entity::position(&invoices, invoice_id)
            .ok_or_else(|| Error::not_found(Invoice::kind(), invoice_id))?;
        let mut stock: Vec<StockItem> = store.load_collection().await?;

        let invoice = invoices.remove(index);
        ledger::release(&mut stock, &invoice.stock_item_ids(), &invoice.id);

        let mut batch = WriteBatch::new();
        batch
            .put(StoreKey::Stock, &stock)?
            .put(StoreKey::Invoices, &invoices)?;
        self.commit(batch).await?;

        info!("✓ Invoice {} deleted", invoice.serial_no);
        Ok(())
    }
}

/// Build invoice lines from the form, copying vehicle details from stock.
fn resolve_items(forms: &[InvoiceItemForm], stock: &[StockItem]) -> Result<Vec<InvoiceItem>> {
    let mut chassis = HashSet::new();
    let mut items = Vec::with_capacity(forms.len());
    for (line, form) in forms.iter().enumerate() {
        let unit = entity::find(stock, &form.stock_item_id)
            .ok_or_else(|| Error::not_found(StockItem::kind(), form.stock_item_id.as_str()))?;
        if !chassis.insert(unit.chassis_no.as_str()) {
            return Err(Error::ValidationError(format!(
                "items[{}] chassis {} is already on this invoice",
                line, unit.chassis_no
            )));
        }
        items.push(InvoiceItem {
            id: form
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(new_id),
            stock_item_id: unit.id.clone(),
            model_name: unit.model_name.clone(),
            chassis_no: unit.chassis_no.clone(),
            engine_no: unit.engine_no.clone(),
            colour: unit.colour.clone(),
            qty: 1,
            gst: unit.gst,
            price: unit.price,
            hsn_sac: form.hsn_sac.clone().filter(|h| !h.trim().is_empty()),
            discount_percentage: form.discount_percentage,
        });
    }
    Ok(items)
}

fn commercial_for(customer: &Customer, mut fields: CommercialFields) -> CommercialFields {
    if !customer.is_registered() {
        fields.fill_unregistered_defaults();
    }
    fields
}
