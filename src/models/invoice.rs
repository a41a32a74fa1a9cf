//! Sales invoices.

use super::customer::{invalid, is_digits, CustomerDetails};
use crate::entity::Record;
use crate::error::Result;
use crate::key::StoreKey;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Placeholder written into empty optional fields for non-registered parties.
pub const NOT_APPLICABLE: &str = "N/A";

/// Whether the sale was made under a dealer scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    #[serde(rename = "With Scheme")]
    WithScheme,
    #[serde(rename = "Without Scheme")]
    WithoutScheme,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::WithScheme => write!(f, "With Scheme"),
            Scheme::WithoutScheme => write!(f, "Without Scheme"),
        }
    }
}

/// One vehicle sold on an invoice. Quantity is always 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: String,
    pub stock_item_id: String,
    pub model_name: String,
    pub chassis_no: String,
    pub engine_no: String,
    pub colour: String,
    #[serde(default = "one")]
    pub qty: u32,
    pub gst: f64,
    /// Rate before discount.
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsn_sac: Option<String>,
    #[serde(default)]
    pub discount_percentage: f64,
}

fn one() -> u32 {
    1
}

/// Optional commercial fields.
///
/// Always present on every invoice, each nullable. Whether a field is shown
/// on forms, documents or exports is decided by the `enable*` toggles of
/// [`super::InvoiceSettings`]; the stored shape never changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommercialFields {
    /// Bill type, e.g. "Cash" or a financier name.
    pub cash_or_hypothecation: Option<String>,
    pub on_road_price: Option<f64>,
    pub scheme: Option<Scheme>,
    pub insurance_amount: Option<f64>,
    pub registration_amount: Option<f64>,
    pub accessories_amount: Option<f64>,
    pub sales_person_name: Option<String>,
    pub aadhar_no: Option<String>,
    pub nominee_name: Option<String>,
    pub rto: Option<String>,
}

impl CommercialFields {
    /// Fill blanks with the placeholders used for non-registered parties.
    pub fn fill_unregistered_defaults(&mut self) {
        for field in [
            &mut self.cash_or_hypothecation,
            &mut self.rto,
            &mut self.nominee_name,
            &mut self.sales_person_name,
        ] {
            if field.as_deref().map_or(true, |v| v.trim().is_empty()) {
                *field = Some(NOT_APPLICABLE.to_string());
            }
        }
        if self.scheme.is_none() {
            self.scheme = Some(Scheme::WithoutScheme);
        }
        if self.aadhar_no.is_none() {
            self.aadhar_no = Some(String::new());
        }
    }

    fn validate(&self, aadhar_enabled: bool) -> Result<()> {
        if aadhar_enabled {
            if let Some(aadhar) = self.aadhar_no.as_deref().map(str::trim) {
                if !aadhar.is_empty() && !is_digits(aadhar, 12) {
                    return Err(invalid("aadharNo", "must be 12 digits"));
                }
            }
        }
        for (name, amount) in [
            ("onRoadPrice", self.on_road_price),
            ("insuranceAmount", self.insurance_amount),
            ("registrationAmount", self.registration_amount),
            ("accessoriesAmount", self.accessories_amount),
        ] {
            if amount.is_some_and(|a| a.is_nan() || a < 0.0) {
                return Err(invalid(name, "cannot be negative"));
            }
        }
        Ok(())
    }
}

/// A stored invoice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    /// Printed serial; assigned once at creation and never changed.
    pub serial_no: String,
    pub customer_id: String,
    /// The customer as they were when the invoice was last saved.
    pub customer_details: CustomerDetails,
    pub invoice_date: DateTime<FixedOffset>,
    pub items: Vec<InvoiceItem>,
    #[serde(flatten)]
    pub commercial: CommercialFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Ids of the stock items this invoice holds, in item order.
    pub fn stock_item_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.stock_item_id.clone()).collect()
    }

    pub fn holds(&self, stock_item_id: &str) -> bool {
        self.items.iter().any(|i| i.stock_item_id == stock_item_id)
    }
}

impl Record for Invoice {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn collection() -> StoreKey {
        StoreKey::Invoices
    }

    fn kind() -> &'static str {
        "invoice"
    }
}

/// Input line for an invoice. Vehicle attributes are copied from the stock
/// item at save time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemForm {
    #[serde(default)]
    pub id: Option<String>,
    pub stock_item_id: String,
    #[serde(default)]
    pub hsn_sac: Option<String>,
    #[serde(default)]
    pub discount_percentage: f64,
}

impl InvoiceItemForm {
    pub fn new(stock_item_id: impl Into<String>) -> Self {
        InvoiceItemForm {
            stock_item_id: stock_item_id.into(),
            ..Default::default()
        }
    }
}

/// Input for creating or editing an invoice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceForm {
    pub customer_id: String,
    pub invoice_date: DateTime<FixedOffset>,
    pub items: Vec<InvoiceItemForm>,
    #[serde(flatten)]
    pub commercial: CommercialFields,
}

impl InvoiceForm {
    /// Check the form's own fields. Referenced records are checked by the
    /// service.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` naming the first offending field.
    pub fn validate(&self, aadhar_enabled: bool) -> Result<()> {
        if self.customer_id.trim().is_empty() {
            return Err(invalid("customerId", "is required"));
        }
        if self.items.is_empty() {
            return Err(invalid(
                "items",
                "must contain at least one item",
            ));
        }
        let mut seen = HashSet::new();
        for (line, item) in self.items.iter().enumerate() {
            if item.stock_item_id.trim().is_empty() {
                return Err(invalid(&format!("items[{}].stockItemId", line), "is required"));
            }
            if !seen.insert(item.stock_item_id.as_str()) {
                return Err(invalid(
                    &format!("items[{}].stockItemId", line),
                    "is already on this invoice",
                ));
            }
            let d = item.discount_percentage;
            if d.is_nan() || !(0.0..=100.0).contains(&d) {
                return Err(invalid(
                    &format!("items[{}].discountPercentage", line),
                    "must be between 0 and 100",
                ));
            }
        }
        self.commercial.validate(aadhar_enabled)
    }
}
