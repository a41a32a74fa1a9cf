//! Write strategies for multi-key operations.
//!
//! Saving an invoice touches up to three keys (invoices, stock, settings).
//! The store has no transactions, so each write lands on its own. The
//! strategy decides what happens when a later write in the sequence fails.
//!
//! | Strategy | Later write fails | Leaves behind |
//! |----------|-------------------|---------------|
//! | **BestEffort** | Error returned | Earlier writes in place |
//! | **Rollback** | Earlier writes restored, error returned | Keys as they were |
//!
//! ```
//! use dealer_ledger::strategy::WriteStrategy;
//!
//! assert_eq!(WriteStrategy::default(), WriteStrategy::BestEffort);
//! ```

/// What to do with completed writes when a later write in the same
/// operation fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WriteStrategy {
    /// **BestEffort**: stop at the failure and report it.
    ///
    /// A failure mid-sequence may leave stock reserved to an invoice that was
    /// never written.
    #[default]
    BestEffort,

    /// **Rollback**: restore every key this operation already wrote, then
    /// report the original failure.
    ///
    /// Restores are themselves writes; if one fails it is logged and the
    /// remaining keys are still attempted.
    Rollback,
}

impl WriteStrategy {
    pub fn rolls_back(&self) -> bool {
        matches!(self, WriteStrategy::Rollback)
    }
}

impl std::fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteStrategy::BestEffort => write!(f, "BestEffort"),
            WriteStrategy::Rollback => write!(f, "Rollback"),
        }
    }
}
