//! Shared builders for unit tests.

use crate::models::{CommercialFields, CompanyProfile, CustomerForm, Invoice, InvoiceItem};
use chrono::{DateTime, Utc};

pub(crate) fn customer_form(state: &str) -> CustomerForm {
    CustomerForm {
        customer_name: "Ravi Kumar".into(),
        mobile_no: "9876543210".into(),
        address: "12 Station Road".into(),
        state: state.into(),
        district: "Lucknow".into(),
        ..Default::default()
    }
}

pub(crate) fn company(state: &str) -> CompanyProfile {
    CompanyProfile {
        company_name: "Shree Motors".into(),
        legal_name: "Shree Motors Pvt Ltd".into(),
        gst_number: Some("09AABCS1429B1ZX".into()),
        pan_number: "AABCS1429B".into(),
        address: "NH-24, Sitapur Road".into(),
        state: state.into(),
        district: "Lucknow".into(),
        pincode: "226021".into(),
        email: "accounts@shreemotors.in".into(),
        phone: "+919876543210".into(),
        bank_details: "SBI 0001".into(),
        ..CompanyProfile::default()
    }
}

pub(crate) fn item(chassis: &str, gst: f64, price: f64) -> InvoiceItem {
    InvoiceItem {
        id: format!("line-{}", chassis),
        stock_item_id: format!("stock-{}", chassis),
        model_name: "Splendor+".into(),
        chassis_no: chassis.into(),
        engine_no: format!("E-{}", chassis),
        colour: "Black".into(),
        qty: 1,
        gst,
        price,
        hsn_sac: None,
        discount_percentage: 0.0,
    }
}

pub(crate) fn invoice(id: &str, customer_state: &str, items: Vec<InvoiceItem>) -> Invoice {
    Invoice {
        id: id.into(),
        serial_no: "NON-INV-001".into(),
        customer_id: "cust".into(),
        customer_details: customer_form(customer_state).into_details(),
        invoice_date: DateTime::parse_from_rfc3339("2024-05-01T11:00:00+05:30").unwrap(),
        items,
        commercial: CommercialFields::default(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
