//! Postcard-based record encoding with versioned envelopes.
//!
//! The in-memory store keeps every record as encoded bytes rather than as a
//! live value, so a record handed out by the store can never alias the stored
//! copy. Every stored entry follows this format:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "CATR"              u32               postcard::to_allocvec(T)
//! ```
//!
//! Stored types must not rely on self-describing formats: no
//! `#[serde(flatten)]`, no `skip_serializing_if`, no untagged enums.
//! Decimals are encoded as strings and timestamps as RFC 3339 strings.
//!
//! # Example
//!
//! ```rust
//! use catering_kit::serialization::{decode_record, encode_record};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Dish {
//!     id: i64,
//!     name: String,
//! }
//!
//! # fn main() -> catering_kit::Result<()> {
//! let dish = Dish { id: 1, name: "Soup".to_string() };
//! let bytes = encode_record(&dish)?;
//! let decoded: Dish = decode_record(&bytes)?;
//! assert_eq!(dish, decoded);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for stored records: b"CATR"
pub const RECORD_MAGIC: [u8; 4] = *b"CATR";

/// Current schema version.
///
/// Increment when a stored entity changes shape (fields added, removed,
/// reordered or retyped, enum variants changed).
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope around a stored record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordEnvelope<T> {
    /// Magic header: must be b"CATR"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    /// The stored record
    pub payload: T,
}

impl<T> RecordEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: RECORD_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a record with its envelope.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn encode_record<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = RecordEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Record encoding failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode a record, validating magic and schema version first.
///
/// # Errors
///
/// - `Error::DeserializationError`: Corrupted Postcard payload
/// - `Error::InvalidRecordEntry`: Invalid magic header
/// - `Error::VersionMismatch`: Schema version mismatch
pub fn decode_record<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: RecordEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        error!("Record decoding failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != RECORD_MAGIC {
        warn!(
            "Invalid record entry: expected magic {:?}, got {:?}",
            RECORD_MAGIC, envelope.magic
        );
        return Err(Error::InvalidRecordEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            RECORD_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Record version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
