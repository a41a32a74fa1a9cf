//! Spreadsheet export rows.
//!
//! One row per invoice item. Invoice-level columns are filled only on the
//! first row of each invoice; optional commercial columns stay blank unless
//! their `enable*` toggle is on.

use crate::models::{Invoice, InvoiceItem, InvoiceSettings};
use serde::{Serialize, Serializer};
use std::fmt;

/// Column headers, in order.
pub const EXPORT_HEADERS: [&str; 28] = [
    "Invoice No.",
    "Invoice Date",
    "Customer Name",
    "Father Name",
    "Mobile No.",
    "Customer DOB",
    "Address",
    "Customer GST No.",
    "Party Type",
    "Aadhar No.",
    "Nominee Name",
    "RTO",
    "Sales Person Name",
    "Cash/Hypothecation",
    "On Road Price",
    "Scheme",
    "Insurance Amount",
    "Registration Amount",
    "Accessories Amount",
    "Item - Model Name",
    "Item - Chassis No",
    "Item - Engine No",
    "Item - Colour",
    "Item - Qty",
    "Item - Price",
    "Item - GST (%)",
    "Item - GST Amount",
    "Item - Total Price (incl. GST)",
];

/// Number of leading invoice-level columns.
const INVOICE_COLUMNS: usize = 19;

/// One spreadsheet cell.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportCell {
    Text(String),
    Number(f64),
    Blank,
}

impl Serialize for ExportCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExportCell::Text(s) => serializer.serialize_str(s),
            ExportCell::Number(n) => serializer.serialize_f64(*n),
            ExportCell::Blank => serializer.serialize_str(""),
        }
    }
}

impl ExportCell {
    fn text(s: impl Into<String>) -> Self {
        ExportCell::Text(s.into())
    }

    fn text_or_blank(s: Option<&str>) -> Self {
        match s.filter(|v| !v.is_empty()) {
            Some(v) => ExportCell::text(v),
            None => ExportCell::Blank,
        }
    }

    fn gated_text(enabled: bool, s: Option<&str>) -> Self {
        if enabled {
            Self::text_or_blank(s)
        } else {
            ExportCell::Blank
        }
    }

    fn gated_number(enabled: bool, n: Option<f64>) -> Self {
        match n {
            Some(v) if enabled => ExportCell::Number(v),
            _ => ExportCell::Blank,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, ExportCell::Blank)
    }
}

impl fmt::Display for ExportCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportCell::Text(s) => f.write_str(s),
            ExportCell::Number(n) => write!(f, "{}", n),
            ExportCell::Blank => Ok(()),
        }
    }
}

/// One spreadsheet row, cells aligned with [`EXPORT_HEADERS`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExportRow {
    pub cells: Vec<ExportCell>,
}

impl ExportRow {
    /// Cell under `header`, if the header exists.
    pub fn get(&self, header: &str) -> Option<&ExportCell> {
        EXPORT_HEADERS
            .iter()
            .position(|h| *h == header)
            .and_then(|i| self.cells.get(i))
    }
}

/// Build export rows for `invoices`, in the order given.
pub fn export_rows(invoices: &[Invoice], settings: &InvoiceSettings) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for invoice in invoices {
        for (index, item) in invoice.items.iter().enumerate() {
            let mut cells = if index == 0 {
                invoice_cells(invoice, settings)
            } else {
                vec![ExportCell::Blank; INVOICE_COLUMNS]
            };
            cells.extend(item_cells(item));
            rows.push(ExportRow { cells });
        }
    }
    debug!(
        "Export built {} rows from {} invoices",
        rows.len(),
        invoices.len()
    );
    rows
}

fn invoice_cells(invoice: &Invoice, s: &InvoiceSettings) -> Vec<ExportCell> {
    let customer = &invoice.customer_details;
    let extras = &invoice.commercial;
    let dob = customer
        .dob
        .filter(|_| s.enable_customer_dob_display)
        .map(|d| d.format("%Y-%m-%d").to_string());

    vec![
        ExportCell::text(invoice.serial_no.as_str()),
        ExportCell::text(invoice.invoice_date.format("%Y-%m-%d").to_string()),
        ExportCell::text(customer.customer_name.as_str()),
        ExportCell::text_or_blank(customer.father_name.as_deref()),
        ExportCell::text(customer.mobile_no.as_str()),
        ExportCell::text_or_blank(dob.as_deref()),
        ExportCell::text(customer.full_address()),
        ExportCell::text_or_blank(customer.gst_no.as_deref()),
        ExportCell::text(if customer.is_registered() {
            "Registered"
        } else {
            "Non-Registered"
        }),
        ExportCell::gated_text(s.enable_aadhar_no, extras.aadhar_no.as_deref()),
        ExportCell::gated_text(s.enable_nominee_name, extras.nominee_name.as_deref()),
        ExportCell::gated_text(s.enable_rto, extras.rto.as_deref()),
        ExportCell::gated_text(s.enable_sales_person, extras.sales_person_name.as_deref()),
        ExportCell::gated_text(
            s.enable_cash_or_hypothecation,
            extras.cash_or_hypothecation.as_deref(),
        ),
        ExportCell::gated_number(s.enable_on_road_price, extras.on_road_price),
        ExportCell::gated_text(
            s.enable_scheme,
            extras.scheme.map(|sch| sch.to_string()).as_deref(),
        ),
        ExportCell::gated_number(s.enable_insurance, extras.insurance_amount),
        ExportCell::gated_number(s.enable_registration, extras.registration_amount),
        ExportCell::gated_number(s.enable_accessories, extras.accessories_amount),
    ]
}

fn item_cells(item: &InvoiceItem) -> Vec<ExportCell> {
    let gst_amount = item.price * item.gst / 100.0;
    vec![
        ExportCell::text(item.model_name.as_str()),
        ExportCell::text(item.chassis_no.as_str()),
        ExportCell::text(item.engine_no.as_str()),
        ExportCell::text(item.colour.as_str()),
        ExportCell::Number(f64::from(item.qty)),
        ExportCell::Number(item.price),
        ExportCell::Number(item.gst),
        ExportCell::Number(gst_amount),
        ExportCell::Number(item.price + gst_amount),
    ]
}
