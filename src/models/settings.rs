//! Settings objects: invoice numbering and visibility, company profile, UI.

use super::customer::{invalid, is_digits};
use crate::error::Result;
use crate::serialization::lenient_counter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix used when a branch prefix is unset or empty.
pub const FALLBACK_SERIAL_PREFIX: &str = "INV-";

const MAX_PREFIX_LEN: usize = 10;
const MAX_CUSTOM_PREFIX_LEN: usize = 5;

/// Invoice numbering counters and field visibility toggles.
///
/// Missing fields take their default on read, except counters: a stored
/// counter that is missing, non-numeric or non-positive reads as `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceSettings {
    pub registered_prefix: String,
    pub non_registered_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prefix: Option<String>,
    /// Legacy high-water mark across both branches.
    #[serde(default, deserialize_with = "lenient_counter")]
    pub next_serial_no: Option<u64>,
    #[serde(default, deserialize_with = "lenient_counter")]
    pub next_registered_serial_no: Option<u64>,
    #[serde(default, deserialize_with = "lenient_counter")]
    pub next_non_registered_serial_no: Option<u64>,
    pub enable_insurance: bool,
    pub enable_registration: bool,
    pub enable_accessories: bool,
    pub enable_sales_person: bool,
    pub enable_cash_or_hypothecation: bool,
    pub enable_on_road_price: bool,
    pub enable_scheme: bool,
    pub enable_aadhar_no: bool,
    pub enable_nominee_name: bool,
    #[serde(rename = "enableRTO")]
    pub enable_rto: bool,
    #[serde(rename = "enableCustomerDOBDisplay")]
    pub enable_customer_dob_display: bool,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        InvoiceSettings {
            registered_prefix: "REG-INV-".to_string(),
            non_registered_prefix: "NON-INV-".to_string(),
            custom_prefix: None,
            next_serial_no: Some(1),
            next_registered_serial_no: Some(1),
            next_non_registered_serial_no: Some(1),
            enable_insurance: false,
            enable_registration: false,
            enable_accessories: false,
            enable_sales_person: false,
            enable_cash_or_hypothecation: true,
            enable_on_road_price: true,
            enable_scheme: true,
            enable_aadhar_no: false,
            enable_nominee_name: false,
            enable_rto: false,
            enable_customer_dob_display: false,
        }
    }
}

impl InvoiceSettings {
    /// Prefix for the given branch, falling back to [`FALLBACK_SERIAL_PREFIX`].
    pub fn prefix_for(&self, is_registered: bool) -> &str {
        let prefix = if is_registered {
            &self.registered_prefix
        } else {
            &self.non_registered_prefix
        };
        if prefix.is_empty() {
            FALLBACK_SERIAL_PREFIX
        } else {
            prefix
        }
    }

    /// Stored counter for the given branch, if any.
    pub fn branch_counter(&self, is_registered: bool) -> Option<u64> {
        if is_registered {
            self.next_registered_serial_no
        } else {
            self.next_non_registered_serial_no
        }
    }

    pub(crate) fn set_branch_counter(&mut self, is_registered: bool, value: u64) {
        if is_registered {
            self.next_registered_serial_no = Some(value);
        } else {
            self.next_non_registered_serial_no = Some(value);
        }
    }

    /// Check values entered on the settings screen.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.registered_prefix.chars().count() > MAX_PREFIX_LEN {
            return Err(invalid("registeredPrefix", "is too long (max 10 chars)"));
        }
        if self.non_registered_prefix.chars().count() > MAX_PREFIX_LEN {
            return Err(invalid("nonRegisteredPrefix", "is too long (max 10 chars)"));
        }
        if self
            .custom_prefix
            .as_deref()
            .is_some_and(|p| p.chars().count() > MAX_CUSTOM_PREFIX_LEN)
        {
            return Err(invalid("customPrefix", "is too long (max 5 chars)"));
        }
        for (name, counter) in [
            ("nextSerialNo", self.next_serial_no),
            ("nextRegisteredSerialNo", self.next_registered_serial_no),
            ("nextNonRegisteredSerialNo", self.next_non_registered_serial_no),
        ] {
            if counter.map_or(true, |c| c < 1) {
                return Err(invalid(name, "must be at least 1"));
            }
        }
        Ok(())
    }
}

/// The selling company's details, printed on every document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_name: String,
    pub legal_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_number: Option<String>,
    pub pan_number: String,
    pub address: String,
    pub state: String,
    pub district: String,
    pub pincode: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub bank_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_url: Option<String>,
    #[serde(default)]
    pub financial_year_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub financial_year_end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_and_conditions: Option<String>,
    /// Two-digit GST state code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
}

/// Printed when a profile carries no terms of its own.
pub const DEFAULT_TERMS_AND_CONDITIONS: &str = "\
1. Goods once sold will not be taken back.
2. Interest @18% p.a. will be charged if payment is not made within due date.
3. Subject to jurisdiction.
4. All disputes subject to jurisdiction only.
5. Warranty as per manufacturer's terms.";

impl Default for CompanyProfile {
    /// Blank template offered before the first save.
    fn default() -> Self {
        CompanyProfile {
            company_name: String::new(),
            legal_name: String::new(),
            gst_number: None,
            pan_number: String::new(),
            address: String::new(),
            state: String::new(),
            district: String::new(),
            pincode: String::new(),
            email: String::new(),
            phone: String::new(),
            website: None,
            logo_url: None,
            bank_details: String::new(),
            signature_url: None,
            financial_year_start: None,
            financial_year_end: None,
            terms_and_conditions: Some(DEFAULT_TERMS_AND_CONDITIONS.to_string()),
            state_code: Some("09".to_string()),
        }
    }
}

impl CompanyProfile {
    /// Terms split into printable lines, using the default text when unset.
    pub fn terms_lines(&self) -> Vec<&str> {
        self.terms_and_conditions
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TERMS_AND_CONDITIONS)
            .lines()
            .collect()
    }

    /// Check the profile before saving.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("companyName", &self.company_name),
            ("legalName", &self.legal_name),
            ("address", &self.address),
            ("state", &self.state),
            ("district", &self.district),
            ("bankDetails", &self.bank_details),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(name, "is required"));
            }
        }
        if let Some(gst) = self.gst_number.as_deref().filter(|g| !g.is_empty()) {
            if gst.len() != 15
                || !gst
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            {
                return Err(invalid("gstNumber", "must be 15 alphanumeric characters"));
            }
        }
        if !is_pan(&self.pan_number) {
            return Err(invalid("panNumber", "has an invalid format"));
        }
        if !is_digits(&self.pincode, 6) {
            return Err(invalid("pincode", "must be 6 digits"));
        }
        if !is_email(&self.email) {
            return Err(invalid("email", "is not a valid email address"));
        }
        if !is_phone(&self.phone) {
            return Err(invalid("phone", "is not a valid phone number"));
        }
        if let Some(code) = self.state_code.as_deref().filter(|c| !c.is_empty()) {
            if !is_digits(code, 2) {
                return Err(invalid("stateCode", "must be 2 digits"));
            }
        }
        if let (Some(start), Some(end)) = (self.financial_year_start, self.financial_year_end) {
            if end <= start {
                return Err(invalid("financialYearEnd", "must be after start date"));
            }
        }
        Ok(())
    }
}

/// `AAAAA9999A`
fn is_pan(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[..5].iter().all(u8::is_ascii_uppercase)
        && b[5..9].iter().all(u8::is_ascii_digit)
        && b[9].is_ascii_uppercase()
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// E.164-ish: optional `+`, then 2 to 15 digits not starting with 0.
fn is_phone(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    (2..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

/// UI colour scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::System => write!(f, "system"),
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    pub theme: Theme,
    pub default_items_per_page: u32,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        GeneralSettings {
            theme: Theme::System,
            default_items_per_page: 20,
        }
    }
}

impl GeneralSettings {
    /// # Errors
    ///
    /// Returns `Error::ValidationError` if items per page is outside 5..=100.
    pub fn validate(&self) -> Result<()> {
        if !(5..=100).contains(&self.default_items_per_page) {
            return Err(invalid("defaultItemsPerPage", "must be between 5 and 100"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn profile() -> CompanyProfile {
        CompanyProfile {
            company_name: "Shree Motors".into(),
            legal_name: "Shree Motors Pvt Ltd".into(),
            gst_number: Some("09AABCS1429B1ZX".into()),
            pan_number: "AABCS1429B".into(),
            address: "NH-24, Sitapur Road".into(),
            state: "Uttar Pradesh".into(),
            district: "Lucknow".into(),
            pincode: "226021".into(),
            email: "accounts@shreemotors.in".into(),
            phone: "+919876543210".into(),
            bank_details: "SBI 0001 IFSC SBIN0000001".into(),
            ..CompanyProfile::default()
        }
    }

    #[test]
    fn test_invoice_settings_defaults() {
        let settings = InvoiceSettings::default();
        assert_eq!(settings.prefix_for(true), "REG-INV-");
        assert_eq!(settings.prefix_for(false), "NON-INV-");
        assert!(settings.enable_scheme);
        assert!(!settings.enable_rto);
    }

    #[test]
    fn test_empty_prefix_falls_back() {
        let settings = InvoiceSettings {
            registered_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(settings.prefix_for(true), FALLBACK_SERIAL_PREFIX);
    }

    #[test]
    fn test_lenient_counters_on_read() {
        let json = r#"{
            "registeredPrefix": "R-",
            "nextSerialNo": "7",
            "nextRegisteredSerialNo": -3,
            "nextNonRegisteredSerialNo": "abc",
            "enableRTO": true
        }"#;
        let settings: InvoiceSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.next_serial_no, Some(7));
        assert_eq!(settings.next_registered_serial_no, None);
        assert_eq!(settings.next_non_registered_serial_no, None);
        assert_eq!(settings.non_registered_prefix, "NON-INV-");
        assert!(settings.enable_rto);
    }

    #[test]
    fn test_missing_counter_reads_as_absent() {
        let settings: InvoiceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.next_registered_serial_no, None);
        assert_eq!(settings.registered_prefix, "REG-INV-");
        assert!(settings.enable_cash_or_hypothecation);
    }

    #[test]
    fn test_invoice_settings_validation() {
        let long = InvoiceSettings {
            registered_prefix: "ABCDEFGHIJK".into(),
            ..Default::default()
        };
        assert!(matches!(long.validate(), Err(Error::ValidationError(_))));

        let zero = InvoiceSettings {
            next_registered_serial_no: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        assert!(InvoiceSettings::default().validate().is_ok());
    }

    #[test]
    fn test_company_profile_validation() {
        assert!(profile().validate().is_ok());

        let bad_pan = CompanyProfile {
            pan_number: "ABCDE12345".into(),
            ..profile()
        };
        assert!(bad_pan.validate().is_err());

        let bad_code = CompanyProfile {
            state_code: Some("9".into()),
            ..profile()
        };
        assert!(bad_code.validate().is_err());

        let start = DateTime::parse_from_rfc3339("2024-04-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let backwards = CompanyProfile {
            financial_year_start: Some(start),
            financial_year_end: Some(start),
            ..profile()
        };
        match backwards.validate() {
            Err(Error::ValidationError(msg)) => assert!(msg.contains("financialYearEnd")),
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_terms_lines_fall_back_to_default() {
        let profile = CompanyProfile {
            terms_and_conditions: Some("  ".into()),
            ..profile()
        };
        assert_eq!(profile.terms_lines().len(), 5);
    }

    #[test]
    fn test_general_settings() {
        let settings: GeneralSettings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.default_items_per_page, 20);

        let bad = GeneralSettings {
            default_items_per_page: 200,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
