//! GST breakdown of an invoice.
//!
//! Intra-state sales split the rate into CGST and SGST at half the rate
//! each; inter-state sales charge IGST at the full rate. The comparison is
//! between the company's state and the state in the invoice's customer
//! snapshot, ignoring case.

use crate::models::{CompanyProfile, Invoice, InvoiceItem};
use serde::Serialize;

/// Tax figures for one invoice line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLine {
    pub stock_item_id: String,
    /// GST rate in percent.
    pub rate: f64,
    /// `price × qty`.
    pub taxable: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
}

impl TaxLine {
    pub fn total_tax(&self) -> f64 {
        self.cgst + self.sgst + self.igst
    }
}

/// Per-line and whole-invoice tax figures.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    /// True when CGST/SGST apply, false for IGST.
    pub intra_state: bool,
    pub lines: Vec<TaxLine>,
    pub taxable: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub total_tax: f64,
    /// Taxable value plus taxes plus insurance, registration and
    /// accessories amounts.
    pub bill_total: f64,
}

/// Compute the tax table and bill total of `invoice`.
///
/// # Example
///
/// ```ignore
/// let totals = tax_breakdown(&invoice, &company);
/// println!("Bill Total {:.2}", totals.bill_total);
/// ```
pub fn tax_breakdown(invoice: &Invoice, company: &CompanyProfile) -> TaxBreakdown {
    let intra_state = same_state(&company.state, &invoice.customer_details.state);

    let lines: Vec<TaxLine> = invoice
        .items
        .iter()
        .map(|item| {
            let taxable = item.price * f64::from(item.qty);
            let (cgst, sgst, igst) = if intra_state {
                let half = taxable * (item.gst / 2.0) / 100.0;
                (half, half, 0.0)
            } else {
                (0.0, 0.0, taxable * item.gst / 100.0)
            };
            TaxLine {
                stock_item_id: item.stock_item_id.clone(),
                rate: item.gst,
                taxable,
                cgst,
                sgst,
                igst,
            }
        })
        .collect();

    let taxable: f64 = lines.iter().map(|l| l.taxable).sum();
    let cgst: f64 = lines.iter().map(|l| l.cgst).sum();
    let sgst: f64 = lines.iter().map(|l| l.sgst).sum();
    let igst: f64 = lines.iter().map(|l| l.igst).sum();
    let total_tax = cgst + sgst + igst;

    let extras = &invoice.commercial;
    let bill_total = taxable
        + total_tax
        + extras.insurance_amount.unwrap_or(0.0)
        + extras.registration_amount.unwrap_or(0.0)
        + extras.accessories_amount.unwrap_or(0.0);

    TaxBreakdown {
        intra_state,
        lines,
        taxable,
        cgst,
        sgst,
        igst,
        total_tax,
        bill_total,
    }
}

fn same_state(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// HSN/SAC code printed for a line: the item's own code, else characters
/// 3..=6 of the company GSTIN, else `N/A`.
pub fn hsn_display(item: &InvoiceItem, company: &CompanyProfile) -> String {
    if let Some(code) = item.hsn_sac.as_deref().filter(|c| !c.is_empty()) {
        return code.to_string();
    }
    company
        .gst_number
        .as_deref()
        .and_then(|gst| gst.get(2..6))
        .filter(|c| !c.is_empty())
        .unwrap_or(crate::models::NOT_APPLICABLE)
        .to_string()
}
