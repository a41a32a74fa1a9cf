//! # dealer-ledger
//!
//! Records engine for a two-wheeler dealership: customers, purchase entries,
//! vehicle stock and sales invoices, persisted as JSON text under a small
//! set of fixed keys.
//!
//! ## Features
//!
//! - **Serial numbering:** Separate registered and non-registered invoice
//!   sequences (`REG-INV-001`, `NON-INV-001`) that never repeat
//! - **Stock reservation:** Every vehicle on an invoice is marked sold to
//!   that invoice and released again on edit or delete
//! - **Backend Agnostic:** In-memory (optionally quota-limited) and
//!   file-per-key backends, or your own [`StoreBackend`]
//! - **Consistent writes:** Each operation validates first and writes its
//!   keys as one batch, with optional rollback on a failed write
//! - **Backup/restore:** The whole store as one JSON document
//!
//! ## Quick Start
//!
//! ```ignore
//! use dealer_ledger::{DealerService, backend::InMemoryBackend};
//! use dealer_ledger::models::{CustomerForm, InvoiceForm, InvoiceItemForm};
//!
//! let ledger = DealerService::new(InMemoryBackend::new());
//!
//! // 1. Record the supplier and the vehicles bought from them
//! let supplier = ledger.create_customer(supplier_form).await?;
//! ledger.create_purchase(purchase_form).await?;
//!
//! // 2. Sell a vehicle from stock
//! let buyer = ledger.create_customer(buyer_form).await?;
//! let stock = ledger.list_available_stock(None).await?;
//! let invoice = ledger
//!     .create_invoice(InvoiceForm {
//!         customer_id: buyer.id.clone(),
//!         items: vec![InvoiceItemForm::new(stock[0].id.clone())],
//!         ..invoice_form
//!     })
//!     .await?;
//! assert_eq!(invoice.serial_no, "NON-INV-001");
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod config;
pub mod entity;
pub mod error;
pub mod key;
pub mod ledger;
pub mod models;
pub mod observability;
pub mod render;
pub mod repository;
pub mod serial;
pub mod serialization;
pub mod service;
pub mod strategy;

#[cfg(test)]
mod fixtures;

// Re-exports for convenience
pub use backend::StoreBackend;
pub use config::ServiceConfig;
pub use entity::Record;
pub use error::{Error, Result};
pub use key::StoreKey;
pub use service::{DateRange, DealerService};
pub use strategy::WriteStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
