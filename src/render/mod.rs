//! Document rendering contract and the figures documents print.
//!
//! The ledger ships no PDF or spreadsheet engine. Front-ends implement
//! [`DocumentRenderer`] and call [`tax_breakdown`] and [`export_rows`] for
//! the numbers, so every artifact agrees on tax splits and totals.
//! [`TextRenderer`] is the built-in plain-text implementation.

pub mod export;
pub mod tax;
pub mod text;

pub use export::{export_rows, ExportCell, ExportRow, EXPORT_HEADERS};
pub use tax::{hsn_display, tax_breakdown, TaxBreakdown, TaxLine};
pub use text::TextRenderer;

use crate::error::Result;
use crate::models::{CompanyProfile, Invoice, InvoiceSettings};
use std::fmt;

/// Printable artifacts produced from a saved invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Priced document with the tax table and bill total.
    TaxInvoice,
    /// Unpriced delivery note: description, HSN/SAC, quantity, remarks.
    DeliveryChallan,
}

impl DocumentKind {
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::TaxInvoice => "TAX INVOICE",
            DocumentKind::DeliveryChallan => "DELIVERY CHALLAN",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Turns a finalized invoice into a document.
///
/// Implementations are stateless with respect to the ledger: they receive
/// everything they print and never write back.
///
/// # Example
///
/// ```ignore
/// struct PdfRenderer { /* fonts, page size */ }
///
/// impl DocumentRenderer for PdfRenderer {
///     fn render(&self, kind: DocumentKind, invoice: &Invoice,
///               company: &CompanyProfile, settings: &InvoiceSettings) -> Result<Vec<u8>> {
///         let totals = tax_breakdown(invoice, company);
///         // lay out pages ...
///     }
/// }
/// ```
pub trait DocumentRenderer: Send + Sync {
    /// Render `invoice` as `kind`.
    ///
    /// `settings` decides which optional commercial fields are printed and
    /// whether the customer's date of birth is shown.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the artifact cannot be produced.
    fn render(
        &self,
        kind: DocumentKind,
        invoice: &Invoice,
        company: &CompanyProfile,
        settings: &InvoiceSettings,
    ) -> Result<Vec<u8>>;
}
