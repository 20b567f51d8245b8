//! In-memory record store (default, thread-safe, async).
//!
//! Uses DashMap for concurrent access with per-key sharding. Records are held
//! as encoded bytes, so callers always receive copies.

use super::RecordStore;
use crate::error::{Error, Result};
use crate::key::RecordKeyBuilder;
use crate::observability::LatencyPolicy;
use crate::record::{sort_canonical, Record, RecordId};
use dashmap::DashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Thread-safe async in-memory record store for one entity kind.
///
/// Ids start at 1 and are never reused, so a deleted id stays `NotFound`.
///
/// # Example
///
/// ```no_run
/// use catering_kit::model::{MenuCategory, MenuItem};
/// use catering_kit::store::{InMemoryStore, RecordStore};
/// use rust_decimal::Decimal;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::<MenuItem>::new();
///
///     let tea = store
///         .create(MenuItem::new("Tea", MenuCategory::Beverages, Decimal::new(2, 0)))
///         .await?;
///     assert_eq!(tea.id, 1);
///
///     let fetched = store.fetch_by_id(tea.id).await?;
///     assert_eq!(fetched.name, "Tea");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryStore<T: Record> {
    records: Arc<DashMap<RecordId, Vec<u8>>>,
    next_id: Arc<AtomicI64>,
    latency: LatencyPolicy,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> InMemoryStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        InMemoryStore {
            records: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
            latency: LatencyPolicy::None,
            _marker: PhantomData,
        }
    }

    /// Sleep before every operation, simulating a hosted store.
    pub fn with_latency(mut self, latency: LatencyPolicy) -> Self {
        self.latency = latency;
        self
    }

    /// Create a store pre-loaded with records, keeping their ids.
    ///
    /// Records with a non-positive id get a fresh one. Records are validated
    /// like on `create`.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for an invalid or duplicate record
    pub fn with_records(records: Vec<T>) -> Result<Self> {
        let store = Self::new();
        let mut max_id = 0;
        for record in &records {
            max_id = max_id.max(record.id());
        }
        store.next_id.store(max_id + 1, Ordering::SeqCst);

        for mut record in records {
            record.validate()?;
            if record.id() <= 0 {
                record.assign_id(store.allocate_id());
            }
            let id = record.id();
            if store.records.insert(id, record.encode()?).is_some() {
                return Err(Error::ValidationError(format!(
                    "duplicate seed record {}",
                    RecordKeyBuilder::build::<T>(id)
                )));
            }
        }

        debug!("✓ InMemory SEED {} {} records", store.records.len(), T::kind());
        Ok(store)
    }

    /// Get the current number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get memory statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_records: self.records.len(),
            total_bytes: self.records.iter().map(|entry| entry.value().len()).sum(),
            next_id: self.next_id.load(Ordering::SeqCst),
        }
    }

    /// Remove every record. Ids keep counting from where they were.
    pub fn clear_all(&self) {
        self.records.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all {} records removed!", T::kind());
    }

    fn allocate_id(&self) -> RecordId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn not_found(id: RecordId) -> Error {
        Error::NotFound {
            kind: T::kind(),
            id,
        }
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.latency.delay_for(T::kind()) {
            tokio::time::sleep(delay).await;
        }
    }
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> RecordStore<T> for InMemoryStore<T> {
    async fn fetch_all(&self) -> Result<Vec<T>> {
        self.simulate_latency().await;

        let mut entries: Vec<(RecordId, Vec<u8>)> = self
            .records
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        let mut records = entries
            .iter()
            .map(|(_, bytes)| T::decode(bytes))
            .collect::<Result<Vec<T>>>()?;
        sort_canonical(&mut records);

        debug!("✓ InMemory FETCH_ALL {} -> {} records", T::kind(), records.len());
        Ok(records)
    }

    async fn fetch_by_id(&self, id: RecordId) -> Result<T> {
        self.simulate_latency().await;

        let key = RecordKeyBuilder::build::<T>(id);
        match self.records.get(&id) {
            Some(entry) => {
                debug!("✓ InMemory GET {} -> HIT", key);
                T::decode(entry.value())
            }
            None => {
                debug!("✓ InMemory GET {} -> MISS", key);
                Err(Self::not_found(id))
            }
        }
    }

    async fn create(&self, mut record: T) -> Result<T> {
        self.simulate_latency().await;

        record.validate()?;
        let id = self.allocate_id();
        record.assign_id(id);
        self.records.insert(id, record.encode()?);

        debug!("✓ InMemory CREATE {}", RecordKeyBuilder::build::<T>(id));
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: &T::Patch) -> Result<T> {
        self.simulate_latency().await;

        let mut entry = self.records.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        let mut record = T::decode(entry.value())?;
        record.apply_patch(patch);
        record.assign_id(id);
        record.validate()?;
        *entry.value_mut() = record.encode()?;

        debug!("✓ InMemory UPDATE {}", RecordKeyBuilder::build::<T>(id));
        Ok(record)
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        self.simulate_latency().await;

        if self.records.remove(&id).is_none() {
            return Err(Self::not_found(id));
        }

        debug!("✓ InMemory DELETE {}", RecordKeyBuilder::build::<T>(id));
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}

/// Store statistics.
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub total_records: usize,
    pub total_bytes: usize,
    pub next_id: RecordId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Event, EventPatch, EventStatus, MenuCategory, MenuItem, MenuItemPatch};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn event(title: &str, month: u32) -> Event {
        let date = Utc
            .with_ymd_and_hms(2024, month, 1, 18, 0, 0)
            .single()
            .expect("valid date");
        Event::new(title, date, "Hall", 40)
    }

    #[tokio::test]
    async fn test_inmemory_create_assigns_ids() {
        let store = InMemoryStore::<Event>::new();

        let first = store.create(event("A", 1)).await.expect("Failed to create");
        let second = store.create(event("B", 2)).await.expect("Failed to create");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_inmemory_fetch_all_canonical_order() {
        let store = InMemoryStore::<Event>::new();
        store.create(event("January", 1)).await.expect("Failed to create");
        store.create(event("March", 3)).await.expect("Failed to create");
        store.create(event("February", 2)).await.expect("Failed to create");

        let titles: Vec<String> = store
            .fetch_all()
            .await
            .expect("Failed to fetch")
            .into_iter()
            .map(|e| e.title)
            .collect();

        assert_eq!(titles, vec!["March", "February", "January"]);
    }

    #[tokio::test]
    async fn test_inmemory_fetch_missing_is_not_found() {
        let store = InMemoryStore::<Event>::new();

        let err = store.fetch_by_id(42).await.expect_err("nothing stored");
        assert!(matches!(err, Error::NotFound { kind: "event", id: 42 }));
    }

    #[tokio::test]
    async fn test_inmemory_update_merges_patch() {
        let store = InMemoryStore::<Event>::new();
        let created = store.create(event("Gala", 5)).await.expect("Failed to create");

        let updated = store
            .update(created.id, &EventPatch::status(EventStatus::Confirmed))
            .await
            .expect("Failed to update");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.status, EventStatus::Confirmed);
        assert_eq!(updated.title, "Gala");

        let fetched = store.fetch_by_id(created.id).await.expect("Failed to get");
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_inmemory_invalid_update_leaves_record_untouched() {
        let store = InMemoryStore::<MenuItem>::new();
        let item = store
            .create(MenuItem::new("Cake", MenuCategory::Desserts, Decimal::new(4, 0)))
            .await
            .expect("Failed to create");

        let err = store
            .update(
                item.id,
                &MenuItemPatch {
                    name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("blank name");

        assert!(matches!(err, Error::ValidationError(_)));
        assert_eq!(
            store.fetch_by_id(item.id).await.expect("Failed to get").name,
            "Cake"
        );
    }

    #[tokio::test]
    async fn test_inmemory_update_missing_is_not_found() {
        let store = InMemoryStore::<Event>::new();
        let err = store
            .update(9, &EventPatch::default())
            .await
            .expect_err("nothing stored");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_inmemory_delete() {
        let store = InMemoryStore::<Event>::new();
        let created = store.create(event("Gala", 5)).await.expect("Failed to create");

        store.delete(created.id).await.expect("Failed to delete");

        assert!(store.fetch_all().await.expect("Failed to fetch").is_empty());
        assert!(store
            .fetch_by_id(created.id)
            .await
            .expect_err("deleted")
            .is_not_found());
        assert!(store
            .delete(created.id)
            .await
            .expect_err("already deleted")
            .is_not_found());
    }

    #[tokio::test]
    async fn test_inmemory_ids_not_reused_after_delete() {
        let store = InMemoryStore::<Event>::new();
        let first = store.create(event("A", 1)).await.expect("Failed to create");
        store.delete(first.id).await.expect("Failed to delete");

        let second = store.create(event("B", 1)).await.expect("Failed to create");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_inmemory_with_records_keeps_ids() {
        let mut seeded = event("Seeded", 4);
        seeded.id = 10;

        let store = InMemoryStore::with_records(vec![seeded, event("Fresh", 5)])
            .expect("Failed to seed");

        let fresh = store
            .fetch_all()
            .await
            .expect("Failed to fetch")
            .into_iter()
            .find(|e| e.title == "Fresh")
            .expect("fresh event");
        assert_eq!(fresh.id, 11);
        assert_eq!(store.fetch_by_id(10).await.expect("Failed to get").title, "Seeded");

        let next = store.create(event("Next", 6)).await.expect("Failed to create");
        assert_eq!(next.id, 12);
    }

    #[tokio::test]
    async fn test_inmemory_with_duplicate_seed_rejected() {
        let mut a = event("A", 1);
        a.id = 3;
        let b = a.clone();
        assert!(InMemoryStore::with_records(vec![a, b]).is_err());
    }

    #[tokio::test]
    async fn test_inmemory_clone_shares_records() {
        let store1 = InMemoryStore::<Event>::new();
        let store2 = store1.clone();

        store1.create(event("Shared", 2)).await.expect("Failed to create");
        assert_eq!(store2.len(), 1);
    }

    #[tokio::test]
    async fn test_inmemory_clear_all_and_stats() {
        let store = InMemoryStore::<Event>::new();
        store.create(event("A", 1)).await.expect("Failed to create");
        store.create(event("B", 2)).await.expect("Failed to create");

        let stats = store.stats();
        assert_eq!(stats.total_records, 2);
        assert!(stats.total_bytes > 0);

        store.clear_all();
        assert!(store.is_empty());
        assert_eq!(store.stats().next_id, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_latency_policy_delays_operations() {
        let store =
            InMemoryStore::<Event>::new().with_latency(LatencyPolicy::Fixed(Duration::from_millis(300)));

        let started = tokio::time::Instant::now();
        store.fetch_all().await.expect("Failed to fetch");

        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
