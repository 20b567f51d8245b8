//! Core trait implemented by every stored entity kind.

use crate::error::Result;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Store-assigned identifier, immutable once a record is created.
pub type RecordId = i64;

/// Trait that every entity kind held in a record store implements.
///
/// # Example
///
/// ```
/// use catering_kit::schema::{Field, FieldType, OrderBy, Schema, SortDirection};
/// use catering_kit::{Record, RecordId};
/// use serde::{Deserialize, Serialize};
/// use std::cmp::Ordering;
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct Venue {
///     #[serde(rename = "Id")]
///     id: RecordId,
///     name: String,
/// }
///
/// #[derive(Clone, Debug, Default, Serialize, Deserialize)]
/// struct VenuePatch {
///     name: Option<String>,
/// }
///
/// static VENUE_SCHEMA: Schema = Schema {
///     kind: "venue",
///     fields: &[Field::required("name", FieldType::Text)],
///     order_by: OrderBy { field: "name", direction: SortDirection::Asc },
/// };
///
/// impl Record for Venue {
///     type Patch = VenuePatch;
///
///     fn schema() -> &'static Schema { &VENUE_SCHEMA }
///     fn id(&self) -> RecordId { self.id }
///     fn assign_id(&mut self, id: RecordId) { self.id = id; }
///     fn apply_patch(&mut self, patch: &VenuePatch) {
///         if let Some(name) = &patch.name {
///             self.name = name.clone();
///         }
///     }
///     fn canonical_order(a: &Self, b: &Self) -> Ordering { a.name.cmp(&b.name) }
/// }
///
/// assert_eq!(Venue::kind(), "venue");
/// ```
pub trait Record:
    Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone + std::fmt::Debug + 'static
{
    /// Partial update accepted by `RecordStore::update`.
    ///
    /// Patches carry no identifier, so an update can never change a record's id.
    type Patch: Serialize + Clone + Default + Send + Sync + std::fmt::Debug + 'static;

    /// Typed field list and default ordering for this kind.
    fn schema() -> &'static Schema;

    /// Entity kind as named by the record store, e.g. `"menu_item"`.
    fn kind() -> &'static str {
        Self::schema().kind
    }

    /// Store-assigned identifier.
    fn id(&self) -> RecordId;

    /// Called by stores when a record is created.
    fn assign_id(&mut self, id: RecordId);

    /// Merge a partial update into this record.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Ordering used by `fetch_all` and every derived list view.
    fn canonical_order(a: &Self, b: &Self) -> Ordering;

    /// Optional: reject malformed records before they are written.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Encode for in-memory storage.
    ///
    /// See `crate::serialization` for the envelope format.
    fn encode(&self) -> Result<Vec<u8>> {
        crate::serialization::encode_record(self)
    }

    /// Decode from in-memory storage, checking magic and schema version.
    fn decode(bytes: &[u8]) -> Result<Self> {
        crate::serialization::decode_record(bytes)
    }
}

/// Sort a collection into the kind's canonical order.
///
/// `sort_by` is stable, so records that compare equal keep their input order.
pub fn sort_canonical<T: Record>(records: &mut [T]) {
    records.sort_by(T::canonical_order);
}
