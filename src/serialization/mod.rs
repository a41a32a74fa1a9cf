//! JSON text serialization for stored values.
//!
//! Every value the ledger persists (record collections, settings objects) is
//! stored as JSON text under its key. This module is the single place that
//! encodes and decodes that text, so error mapping and logging are uniform.
//!
//! # Example
//!
//! ```rust
//! use dealer_ledger::serialization::{from_store_text, to_store_text};
//!
//! # fn main() -> dealer_ledger::Result<()> {
//! let text = to_store_text(&vec![1u32, 2, 3])?;
//! let back: Vec<u32> = from_store_text("numbers", &text)?;
//! assert_eq!(back, vec![1, 2, 3]);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Encode a value as compact JSON text for storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value cannot be encoded.
pub fn to_store_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        log::error!("Store serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Encode a value as indented JSON text (backup files).
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value cannot be encoded.
pub fn to_pretty_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        log::error!("Store serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode stored JSON text.
///
/// `key` is only used to make the error message point at the broken value.
///
/// # Errors
///
/// Returns `Error::DeserializationError` if the text is not valid JSON for `T`.
pub fn from_store_text<T: DeserializeOwned>(key: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        log::error!("Store deserialization failed for {}: {}", key, e);
        Error::DeserializationError(format!("{}: {}", key, e))
    })
}

/// Decode a loosely typed serial counter.
///
/// Counters written by older front-ends may be numbers, numeric strings,
/// `null`, or garbage. Anything that is not a positive integer reads as
/// `None`, which the allocator treats as "fall back to the next source".
pub fn lenient_counter<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| counter_from_value(&value)))
}

fn counter_from_value(value: &serde_json::Value) -> Option<u64> {
    let n = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (n > 0).then_some(n)
}
