//! Error types for catering-kit.

use crate::record::RecordId;
use std::fmt;

/// Result type for store, aggregation and invoicing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for catering-kit.
///
/// The first three variants are the store-facing taxonomy every caller has to
/// handle. The remaining variants cover local encoding, configuration and
/// unsupported operations.
#[derive(Debug, Clone)]
pub enum Error {
    /// No record of the given kind exists with this id.
    ///
    /// Returned by `fetch_by_id`, `update` and `delete`. A record that was
    /// deleted stays `NotFound` forever since ids are never reused.
    NotFound {
        /// Entity kind, e.g. `"event"`
        kind: &'static str,
        /// Requested identifier
        id: RecordId,
    },

    /// A record or input is malformed or misses a required field.
    ///
    /// Raised when:
    /// - `Record::validate()` rejects a record before create/update
    /// - A remote payload does not match the entity schema
    /// - Invoice computation is given a negative guest count
    ValidationError(String),

    /// The record store could not be reached or answered with a server error.
    ///
    /// **Recovery:** Retry manually; nothing is retried automatically.
    StoreUnavailable(String),

    /// Serialization failed when encoding a record for storage.
    SerializationError(String),

    /// Deserialization failed when decoding stored bytes or a wire payload.
    DeserializationError(String),

    /// Stored entry has a bad envelope (wrong magic or truncated header).
    InvalidRecordEntry(String),

    /// Stored entry was written with another schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from stored entry)
        found: u32,
    },

    /// Configuration could not be read or is inconsistent.
    ConfigError(String),

    /// Feature not enabled or operation not offered by this store.
    NotImplemented(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// True for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { kind, id } => write!(f, "Not found: {} {}", kind, id),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidRecordEntry(msg) => write!(f, "Invalid record entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Record version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
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
            Error::StoreUnavailable(e.to_string())
        } else if e.is_syntax() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else if e.is_data() {
            Error::ValidationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigError(e.to_string())
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

#[cfg(feature = "remote")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::DeserializationError(format!("Remote payload: {}", e))
        } else {
            Error::StoreUnavailable(format!("Remote store: {}", e))
        }
    }
}
