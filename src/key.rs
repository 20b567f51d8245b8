//! Record key formatting for logs and metrics.

use crate::record::{Record, RecordId};

/// Builder for `"{kind}:{id}"` record keys.
pub struct RecordKeyBuilder;

impl RecordKeyBuilder {
    /// Build the key of one record, e.g. `"event:12"`.
    pub fn build<T: Record>(id: RecordId) -> String {
        format!("{}:{}", T::kind(), id)
    }
}
