//! Purchase entries: batches of vehicles received from a supplying party.

use super::customer::{invalid, CustomerDetails};
use crate::entity::Record;
use crate::error::{Error, Result};
use crate::key::StoreKey;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// One vehicle line on a purchase entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub id: String,
    pub model_name: String,
    pub chassis_no: String,
    pub engine_no: String,
    pub colour: String,
    /// GST rate in percent.
    pub gst: f64,
    pub price: f64,
}

/// A stored purchase entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseEntry {
    pub id: String,
    /// Dealership-internal serial, `PUR-NNNNN`.
    pub serial_no: String,
    pub party_id: String,
    #[serde(default)]
    pub party_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_details: Option<CustomerDetails>,
    /// Supplier's invoice number.
    pub invoice_no: String,
    pub invoice_date: DateTime<FixedOffset>,
    pub items: Vec<PurchaseItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for PurchaseEntry {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn collection() -> StoreKey {
        StoreKey::Purchases
    }

    fn kind() -> &'static str {
        "purchase entry"
    }
}

/// Input line for a purchase. `id` is kept when editing an existing line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItemForm {
    #[serde(default)]
    pub id: Option<String>,
    pub model_name: String,
    pub chassis_no: String,
    pub engine_no: String,
    pub colour: String,
    pub gst: f64,
    pub price: f64,
}

impl PurchaseItemForm {
    fn validate(&self, line: usize) -> Result<()> {
        let field = |name: &str| format!("items[{}].{}", line, name);
        if self.model_name.trim().is_empty() {
            return Err(invalid(&field("modelName"), "is required"));
        }
        if !is_identifier(&self.chassis_no) {
            return Err(invalid(
                &field("chassisNo"),
                "must be alphanumeric (hyphens allowed)",
            ));
        }
        if !is_identifier(&self.engine_no) {
            return Err(invalid(
                &field("engineNo"),
                "must be alphanumeric (hyphens allowed)",
            ));
        }
        if self.colour.trim().is_empty() {
            return Err(invalid(&field("colour"), "is required"));
        }
        if self.gst.is_nan() || self.gst < 0.0 {
            return Err(invalid(&field("gst"), "must be non-negative"));
        }
        if self.price.is_nan() || self.price < 0.0 {
            return Err(invalid(&field("price"), "must be non-negative"));
        }
        Ok(())
    }

    pub(crate) fn into_item(self) -> PurchaseItem {
        PurchaseItem {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(crate::entity::new_id),
            model_name: self.model_name,
            chassis_no: self.chassis_no,
            engine_no: self.engine_no,
            colour: self.colour,
            gst: self.gst,
            price: self.price,
        }
    }
}

/// Input for creating or editing a purchase entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseForm {
    /// Caller-chosen serial; derived from the previous entry when absent.
    #[serde(default)]
    pub serial_no: Option<String>,
    pub party_id: String,
    pub invoice_no: String,
    pub invoice_date: DateTime<FixedOffset>,
    pub items: Vec<PurchaseItemForm>,
}

impl PurchaseForm {
    /// Check the form's own fields. Party existence is checked by the service.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.party_id.trim().is_empty() {
            return Err(invalid("partyId", "is required"));
        }
        if self.invoice_no.trim().is_empty() {
            return Err(invalid("invoiceNo", "is required"));
        }
        if self.items.is_empty() {
            return Err(invalid("items", "must contain at least one item"));
        }
        let mut chassis = HashSet::new();
        for (line, item) in self.items.iter().enumerate() {
            item.validate(line)?;
            if !chassis.insert(item.chassis_no.as_str()) {
                return Err(invalid(
                    &format!("items[{}].chassisNo", line),
                    "is listed twice",
                ));
            }
        }
        Ok(())
    }

    /// Add imported lines to the form.
    ///
    /// A form holding only one untouched line (no model, chassis or engine)
    /// has that line replaced; otherwise the imported lines are appended.
    pub fn add_imported_items(&mut self, imported: Vec<PurchaseItemForm>) {
        let untouched = match self.items.as_slice() {
            [only] => {
                only.model_name.is_empty() && only.chassis_no.is_empty() && only.engine_no.is_empty()
            }
            _ => false,
        };
        if untouched {
            self.items = imported;
        } else {
            self.items.extend(imported);
        }
    }
}

/// Header names accepted for each imported column, spreadsheet style first.
const MODEL_HEADERS: [&str; 2] = ["Model Name", "modelName"];
const CHASSIS_HEADERS: [&str; 2] = ["Chassis No", "chassisNo"];
const ENGINE_HEADERS: [&str; 2] = ["Engine No", "engineNo"];
const COLOUR_HEADERS: [&str; 2] = ["Colour", "colour"];
const GST_HEADERS: [&str; 2] = ["GST", "gst"];
const PRICE_HEADERS: [&str; 2] = ["Price", "price"];

/// Map spreadsheet rows to purchase lines.
///
/// Each row is a JSON object keyed by column header, the shape a sheet
/// reader produces. Rows missing a model, chassis, engine or colour are
/// skipped. GST and price are optional: a blank or unreadable cell becomes
/// 0, and leading digits are read the way `"28%"` reads as 28.
///
/// # Errors
///
/// Returns `Error::ValidationError` when no row yields a usable line.
pub fn import_rows(rows: &[Value]) -> Result<Vec<PurchaseItemForm>> {
    let items: Vec<PurchaseItemForm> = rows
        .iter()
        .filter_map(|row| {
            let item = PurchaseItemForm {
                id: None,
                model_name: text_cell(row, &MODEL_HEADERS),
                chassis_no: text_cell(row, &CHASSIS_HEADERS),
                engine_no: text_cell(row, &ENGINE_HEADERS),
                colour: text_cell(row, &COLOUR_HEADERS),
                gst: number_cell(row, &GST_HEADERS),
                price: number_cell(row, &PRICE_HEADERS),
            };
            let complete = [&item.model_name, &item.chassis_no, &item.engine_no, &item.colour]
                .iter()
                .all(|v| !v.is_empty());
            complete.then_some(item)
        })
        .collect();

    if items.is_empty() {
        warn!("Import found no usable rows among {}", rows.len());
        return Err(Error::ValidationError(
            "no valid items found: Model Name, Chassis No, Engine No and Colour are required"
                .to_string(),
        ));
    }
    info!("✓ Imported {} of {} rows", items.len(), rows.len());
    Ok(items)
}

/// First non-empty cell among `headers`, as text.
fn cell<'a>(row: &'a Value, headers: &[&str]) -> Option<&'a Value> {
    headers.iter().filter_map(|h| row.get(*h)).find(|v| match v {
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Bool(b) => *b,
        _ => false,
    })
}

fn text_cell(row: &Value, headers: &[&str]) -> String {
    match cell(row, headers) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn number_cell(row: &Value, headers: &[&str]) -> f64 {
    match cell(row, headers) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => leading_number(s.trim()),
        _ => 0.0,
    }
}

/// Longest numeric prefix of `s`, or 0.
fn leading_number(s: &str) -> f64 {
    let end = s
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && matches!(c, '-' | '+')))
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    (1..=end)
        .rev()
        .find_map(|n| s[..n].parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
