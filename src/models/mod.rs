//! Persisted record and settings types.
//!
//! All types serialize with camelCase field names, the layout the store has
//! always used.

pub mod customer;
pub mod invoice;
pub mod purchase;
pub mod settings;
pub mod stock;

pub use customer::{Customer, CustomerDetails, CustomerForm};
pub use invoice::{
    CommercialFields, Invoice, InvoiceForm, InvoiceItem, InvoiceItemForm, Scheme, NOT_APPLICABLE,
};
pub use purchase::{import_rows, PurchaseEntry, PurchaseForm, PurchaseItem, PurchaseItemForm};
pub use settings::{
    CompanyProfile, GeneralSettings, InvoiceSettings, Theme, DEFAULT_TERMS_AND_CONDITIONS,
    FALLBACK_SERIAL_PREFIX,
};
pub use stock::{AgedStockItem, StockItem};
