//! Plain-text documents for terminals and receipt printers.

use super::{hsn_display, tax_breakdown, DocumentKind, DocumentRenderer};
use crate::error::{Error, Result};
use crate::models::{CompanyProfile, Invoice, InvoiceSettings, NOT_APPLICABLE};
use std::fmt::{self, Write};

/// Renders invoices as fixed-width UTF-8 text.
#[derive(Clone, Debug)]
pub struct TextRenderer {
    width: usize,
}

impl TextRenderer {
    pub fn new() -> Self {
        TextRenderer { width: 72 }
    }

    /// Line width used for rules and centred headings.
    pub fn with_width(width: usize) -> Self {
        TextRenderer {
            width: width.max(40),
        }
    }

    fn write_document(
        &self,
        out: &mut String,
        kind: DocumentKind,
        invoice: &Invoice,
        company: &CompanyProfile,
        settings: &InvoiceSettings,
    ) -> fmt::Result {
        let rule = "-".repeat(self.width);
        let w = self.width;

        writeln!(out, "{:^w$}", kind.title())?;
        writeln!(out, "{:^w$}", "Original For Recipient")?;
        writeln!(out, "{:^w$}", company.company_name)?;
        writeln!(out, "{:^w$}", company.address)?;
        if let Some(gst) = company.gst_number.as_deref().filter(|g| !g.is_empty()) {
            writeln!(out, "{:^w$}", format!("GSTIN: {}", gst))?;
        }
        writeln!(out, "{}", rule)?;

        let customer = &invoice.customer_details;
        let extras = &invoice.commercial;
        writeln!(out, "Invoice No.: {}", invoice.serial_no)?;
        writeln!(out, "Invoice Date: {}", invoice.invoice_date.format("%d/%m/%Y"))?;
        writeln!(out, "Name: {}", customer.customer_name)?;
        writeln!(out, "Address: {}", or_na(&customer.full_address()))?;
        if let Some(gst) = customer.gst_no.as_deref().filter(|g| !g.is_empty()) {
            writeln!(out, "GSTIN: {}", gst)?;
        }
        writeln!(out, "Contact No.: {}", or_na(&customer.mobile_no))?;
        if settings.enable_customer_dob_display {
            if let Some(dob) = customer.dob {
                writeln!(out, "DOB: {}", dob.format("%d/%m/%Y"))?;
            }
        }
        let optional = [
            (settings.enable_aadhar_no, "Aadhaar", extras.aadhar_no.as_deref()),
            (settings.enable_nominee_name, "Nominee", extras.nominee_name.as_deref()),
            (settings.enable_rto, "RTO", extras.rto.as_deref()),
            (
                settings.enable_sales_person,
                "Sales Person",
                extras.sales_person_name.as_deref(),
            ),
            (
                settings.enable_cash_or_hypothecation,
                "Cash/Hypothecation",
                extras.cash_or_hypothecation.as_deref(),
            ),
        ];
        for (enabled, label, value) in optional {
            if let Some(v) = value.filter(|v| enabled && !v.is_empty()) {
                writeln!(out, "{}: {}", label, v)?;
            }
        }
        if settings.enable_scheme {
            if let Some(scheme) = extras.scheme {
                writeln!(out, "Scheme: {}", scheme)?;
            }
        }
        writeln!(out, "{}", rule)?;

        match kind {
            DocumentKind::TaxInvoice => self.write_priced_lines(out, invoice, company, settings)?,
            DocumentKind::DeliveryChallan => write_challan_lines(out, invoice, company)?,
        }

        writeln!(out, "{}", rule)?;
        writeln!(out, "Terms & Conditions")?;
        for line in company.terms_lines() {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
        writeln!(out, "{:>w$}", format!("For {}", company.company_name))?;
        writeln!(out, "{:>w$}", "Authorised Signatory")
    }

    fn write_priced_lines(
        &self,
        out: &mut String,
        invoice: &Invoice,
        company: &CompanyProfile,
        settings: &InvoiceSettings,
    ) -> fmt::Result {
        let totals = tax_breakdown(invoice, company);
        writeln!(
            out,
            "{:<4}{:<28}{:<10}{:>4}{:>12}{:>14}",
            "S No", "Description", "HSN/SAC", "Qty", "Rate", "Total"
        )?;
        for (n, (item, line)) in invoice.items.iter().zip(&totals.lines).enumerate() {
            writeln!(
                out,
                "{:<4}{:<28}{:<10}{:>4}{:>12.2}{:>14.2}",
                n + 1,
                item.model_name,
                hsn_display(item, company),
                item.qty,
                item.price,
                line.taxable + line.total_tax()
            )?;
            writeln!(out, "    Chassis No.: {}", or_na(&item.chassis_no))?;
            writeln!(out, "    Engine No.: {}", or_na(&item.engine_no))?;
            writeln!(out, "    Colour: {}  GST: {}%", item.colour, item.gst)?;
        }

        let w = self.width;
        let amount = |label: &str, value: f64| format!("{}: {:.2}", label, value);
        writeln!(out, "{:>w$}", amount("Taxable Value", totals.taxable))?;
        if totals.intra_state {
            writeln!(out, "{:>w$}", amount("CGST", totals.cgst))?;
            writeln!(out, "{:>w$}", amount("SGST", totals.sgst))?;
        } else {
            writeln!(out, "{:>w$}", amount("IGST", totals.igst))?;
        }
        let extras = &invoice.commercial;
        let charges = [
            (settings.enable_insurance, "Insurance", extras.insurance_amount),
            (
                settings.enable_registration,
                "Registration",
                extras.registration_amount,
            ),
            (
                settings.enable_accessories,
                "Accessories",
                extras.accessories_amount,
            ),
        ];
        for (enabled, label, value) in charges {
            if let Some(v) = value.filter(|_| enabled) {
                writeln!(out, "{:>w$}", amount(label, v))?;
            }
        }
        writeln!(out, "{:>w$}", amount("Bill Total", totals.bill_total))?;
        if settings.enable_on_road_price {
            if let Some(v) = extras.on_road_price {
                writeln!(out, "{:>w$}", amount("On Road Price", v))?;
            }
        }
        Ok(())
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_challan_lines(out: &mut String, invoice: &Invoice, company: &CompanyProfile) -> fmt::Result {
    writeln!(
        out,
        "{:<4}{:<28}{:<10}{:>4}  {}",
        "S No", "Description", "HSN/SAC", "Qty", "Remarks"
    )?;
    for (n, item) in invoice.items.iter().enumerate() {
        writeln!(
            out,
            "{:<4}{:<28}{:<10}{:>4}  {}",
            n + 1,
            item.model_name,
            hsn_display(item, company),
            item.qty,
            NOT_APPLICABLE
        )?;
        writeln!(out, "    Chassis No.: {}", or_na(&item.chassis_no))?;
        writeln!(out, "    Engine No.: {}", or_na(&item.engine_no))?;
    }
    let total_qty: u32 = invoice.items.iter().map(|i| i.qty).sum();
    writeln!(out, "{:<42}{:>4}", "Total", total_qty)
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() {
        NOT_APPLICABLE
    } else {
        s
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(
        &self,
        kind: DocumentKind,
        invoice: &Invoice,
        company: &CompanyProfile,
        settings: &InvoiceSettings,
    ) -> Result<Vec<u8>> {
        let mut out = String::new();
        self.write_document(&mut out, kind, invoice, company, settings)
            .map_err(|e| Error::Other(format!("rendering {} failed: {}", kind, e)))?;
        debug!(
            "✓ Rendered {} for {} ({} bytes)",
            kind,
            invoice.serial_no,
            out.len()
        );
        Ok(out.into_bytes())
    }
}
