//! Error types for the dealership ledger.

use std::fmt;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the ledger.
///
/// Every public operation returns `Result<T>`. Only `StorageError` can
/// leave a partial write behind; every other variant is raised before the
/// first write.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input failed validation before anything was written.
    ///
    /// Raised for missing or malformed fields, an invoice with no items,
    /// a duplicated chassis number, an out-of-range setting and so on.
    /// Nothing has been mutated when this is returned.
    ValidationError(String),

    /// A referenced record does not exist.
    ///
    /// Returned when an operation names a customer, stock item, invoice or
    /// purchase entry id that is not in the store. The operation is aborted
    /// before any write.
    NotFound {
        /// Record kind, e.g. `"customer"`, `"stock item"`.
        kind: &'static str,
        /// The id that could not be resolved.
        id: String,
    },

    /// The durable store rejected a write.
    ///
    /// Common causes:
    /// - Storage quota exceeded
    /// - Filesystem error in the file backend
    ///
    /// Writes that happened earlier in the same operation may already be
    /// visible unless the service runs with `WriteStrategy::Rollback`.
    StorageError(String),

    /// A value could not be encoded as JSON text.
    SerializationError(String),

    /// A stored value could not be decoded.
    ///
    /// Indicates that the text under a store key is not valid JSON for the
    /// expected type (hand-edited storage, truncated file).
    DeserializationError(String),

    /// A backup bundle was rejected. No key was overwritten.
    RestoreError(String),

    /// Feature not implemented by this backend or collaborator.
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::NotFound { kind, id } => write!(f, "Not found: {} {}", kind, id),
            Error::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::RestoreError(msg) => write!(f, "Restore error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::StorageError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StorageError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
