//! Customers (parties) and the snapshot invoices freeze of them.

use crate::entity::Record;
use crate::error::{Error, Result};
use crate::key::StoreKey;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Customer fields without identity or timestamps.
///
/// This is both the body of a [`Customer`] and the frozen `customerDetails`
/// snapshot an invoice or purchase keeps, so later edits to the customer do
/// not rewrite history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    pub mobile_no: String,
    pub address: String,
    pub state: String,
    pub district: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_no: Option<String>,
    #[serde(default)]
    is_registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
}

impl CustomerDetails {
    /// A party is registered iff it carries a non-blank GST number.
    ///
    /// Always derived from `gst_no`; the stored flag is only kept so the
    /// persisted shape matches what front-ends read.
    pub fn is_registered(&self) -> bool {
        is_registered_gst(self.gst_no.as_deref())
    }

    /// One-line postal address, `"addr, district, state - pincode"`.
    pub fn full_address(&self) -> String {
        let mut out = format!("{}, {}, {}", self.address, self.district, self.state);
        if let Some(pin) = self.pincode.as_deref().filter(|p| !p.is_empty()) {
            out.push_str(" - ");
            out.push_str(pin);
        }
        out
    }
}

pub(crate) fn is_registered_gst(gst_no: Option<&str>) -> bool {
    gst_no.is_some_and(|g| !g.trim().is_empty())
}

/// A stored customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    #[serde(flatten)]
    pub details: CustomerDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn is_registered(&self) -> bool {
        self.details.is_registered()
    }

    /// Freeze the customer's current fields for an invoice or purchase.
    pub fn snapshot(&self) -> CustomerDetails {
        let mut details = self.details.clone();
        details.is_registered = details.is_registered();
        details
    }
}

impl Record for Customer {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn collection() -> StoreKey {
        StoreKey::Customers
    }

    fn kind() -> &'static str {
        "customer"
    }
}

/// Input for creating or editing a customer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    pub customer_name: String,
    #[serde(default)]
    pub father_name: Option<String>,
    pub mobile_no: String,
    pub address: String,
    pub state: String,
    pub district: String,
    #[serde(default)]
    pub gst_no: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
}

impl CustomerForm {
    /// Check the form.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.customer_name.trim().chars().count() < 2 {
            return Err(invalid("customerName", "must be at least 2 characters"));
        }
        if !is_digits(&self.mobile_no, 10) {
            return Err(invalid("mobileNo", "must be 10 digits"));
        }
        if self.address.trim().chars().count() < 5 {
            return Err(invalid("address", "must be at least 5 characters"));
        }
        if self.state.trim().chars().count() < 2 {
            return Err(invalid("state", "is required"));
        }
        if self.district.trim().chars().count() < 2 {
            return Err(invalid("district", "is required"));
        }
        if let Some(pin) = self.pincode.as_deref().filter(|p| !p.is_empty()) {
            if !is_digits(pin, 6) {
                return Err(invalid("pincode", "must be 6 digits"));
            }
        }
        if let Some(gst) = self.normalized_gst() {
            if gst.len() != 15 || !gst.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(invalid("gstNo", "must be 15 alphanumeric characters"));
            }
        }
        Ok(())
    }

    /// Upper-cased GST number, `None` when blank.
    pub fn normalized_gst(&self) -> Option<String> {
        self.gst_no
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_uppercase)
    }

    /// Build the detail block, deriving the registration flag.
    pub fn into_details(self) -> CustomerDetails {
        let gst_no = self.normalized_gst();
        let is_registered = is_registered_gst(gst_no.as_deref());
        CustomerDetails {
            customer_name: self.customer_name.trim().to_string(),
            father_name: self.father_name.filter(|f| !f.trim().is_empty()),
            mobile_no: self.mobile_no,
            address: self.address,
            state: self.state,
            district: self.district,
            gst_no,
            is_registered,
            pincode: self.pincode.filter(|p| !p.is_empty()),
            dob: self.dob,
        }
    }
}

impl From<&CustomerDetails> for CustomerForm {
    fn from(details: &CustomerDetails) -> Self {
        CustomerForm {
            customer_name: details.customer_name.clone(),
            father_name: details.father_name.clone(),
            mobile_no: details.mobile_no.clone(),
            address: details.address.clone(),
            state: details.state.clone(),
            district: details.district.clone(),
            gst_no: details.gst_no.clone(),
            pincode: details.pincode.clone(),
            dob: details.dob,
        }
    }
}

pub(crate) fn invalid(field: &str, msg: &str) -> Error {
    Error::ValidationError(format!("{} {}", field, msg))
}

pub(crate) fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.chars().all(|c| c.is_ascii_digit())
}
