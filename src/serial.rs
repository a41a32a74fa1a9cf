//! Serial number allocation.
//!
//! Invoices carry `{prefix}{counter:03}` serials drawn from two independent
//! branches, one for GST-registered parties and one for everyone else. The
//! counters live in [`InvoiceSettings`]; the functions here are pure, taking
//! the settings value in and handing an updated one back for the caller to
//! persist.
//!
//! Purchases use a separate `PUR-NNNNN` scheme derived from the previous
//! entry's serial rather than a stored counter.

use crate::error::{Error, Result};
use crate::models::InvoiceSettings;

/// Prefix of purchase entry serials.
pub const PURCHASE_SERIAL_PREFIX: &str = "PUR-";

/// Counter the branch would issue next, before any fallback to 1.
fn branch_or_legacy(is_registered: bool, settings: &InvoiceSettings) -> Option<u64> {
    settings
        .branch_counter(is_registered)
        .or(settings.next_serial_no)
}

/// Serial the next invoice for this kind of party would receive.
///
/// Does not change anything; calling it twice returns the same value.
///
/// # Example
///
/// ```
/// use dealer_ledger::models::InvoiceSettings;
/// use dealer_ledger::serial::peek_next_serial;
///
/// let settings = InvoiceSettings::default();
/// assert_eq!(peek_next_serial(true, &settings), "REG-INV-001");
/// assert_eq!(peek_next_serial(false, &settings), "NON-INV-001");
/// ```
pub fn peek_next_serial(is_registered: bool, settings: &InvoiceSettings) -> String {
    let counter = branch_or_legacy(is_registered, settings).unwrap_or(1);
    format!("{}{:03}", settings.prefix_for(is_registered), counter)
}

/// Settings after one serial has been issued from the given branch.
///
/// Only the used branch moves, to one past the number [`peek_next_serial`]
/// issued. The legacy `nextSerialNo` is recomputed as
/// the highest of both branch counters and its previous value (at least 1),
/// so it never goes down.
///
/// # Errors
///
/// Returns `Error::ValidationError` when the branch counter is already at
/// `u64::MAX` and no further serial can be issued.
pub fn advance(is_registered: bool, settings: &InvoiceSettings) -> Result<InvoiceSettings> {
    let mut next = settings.clone();
    let issued = branch_or_legacy(is_registered, settings).unwrap_or(1);
    let following = issued.checked_add(1).ok_or_else(|| {
        Error::ValidationError(format!(
            "serial counter exhausted for {}",
            settings.prefix_for(is_registered)
        ))
    })?;
    next.set_branch_counter(is_registered, following);

    let legacy = settings.next_serial_no.unwrap_or(1).max(1);
    let high_water = [
        next.next_registered_serial_no.unwrap_or(0),
        next.next_non_registered_serial_no.unwrap_or(0),
        legacy,
    ]
    .into_iter()
    .max()
    .unwrap_or(legacy);
    next.next_serial_no = Some(high_water);
    Ok(next)
}

/// Serial for a new purchase entry, given the last stored entry's serial.
///
/// Continues from the numeric suffix of a `PUR-` serial; anything else
/// (no previous entry, a hand-typed serial, an unparsable suffix) restarts
/// at `PUR-00001`.
pub fn next_purchase_serial(last_serial: Option<&str>) -> String {
    let next = last_serial
        .and_then(|s| s.strip_prefix(PURCHASE_SERIAL_PREFIX))
        .and_then(|n| n.parse::<u64>().ok())
        .map_or(1, |n| n + 1);
    format!("{}{:05}", PURCHASE_SERIAL_PREFIX, next)
}
