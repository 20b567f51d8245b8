//! Record store abstraction and implementations.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::{Event, Invoice, MenuItem};
use crate::observability::LatencyPolicy;
use crate::record::{Record, RecordId};

pub mod inmemory;
#[cfg(feature = "remote")]
pub mod remote;

pub use inmemory::{InMemoryStore, StoreStats};
#[cfg(feature = "remote")]
pub use remote::{RemoteConfig, RemoteStore};

/// CRUD contract of a record store for one entity kind.
///
/// Implementations: InMemory (default, optionally with artificial latency)
/// and Remote (JSON record service, `remote` feature).
///
/// All methods take `&self`; implementations use interior mutability or
/// external storage, so a store can be cloned and shared freely.
#[allow(async_fn_in_trait)]
pub trait RecordStore<T: Record>: Send + Sync + Clone {
    /// Every record of the kind, in `Record::canonical_order`.
    ///
    /// # Errors
    /// Returns `Error::StoreUnavailable` if the store cannot be reached
    async fn fetch_all(&self) -> Result<Vec<T>>;

    /// One record by id.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if no record has this id
    async fn fetch_by_id(&self, id: RecordId) -> Result<T>;

    /// Store a new record. The id of `record` is ignored and a fresh one is
    /// assigned.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` if the record is malformed
    async fn create(&self, record: T) -> Result<T>;

    /// Merge a partial update into an existing record and return the result.
    ///
    /// # Errors
    /// Returns `Error::NotFound` or `Error::ValidationError`
    async fn update(&self, id: RecordId, patch: &T::Patch) -> Result<T>;

    /// Remove a record.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if no record has this id
    async fn delete(&self, id: RecordId) -> Result<()>;

    /// Number of stored records.
    ///
    /// Default implementation fetches everything.
    async fn count(&self) -> Result<usize> {
        Ok(self.fetch_all().await?.len())
    }

    /// Health check - verify the store is reachable.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// A store selected at runtime from configuration.
#[derive(Clone)]
pub enum AnyStore<T: Record> {
    InMemory(InMemoryStore<T>),
    #[cfg(feature = "remote")]
    Remote(RemoteStore<T>),
}

impl<T: Record> AnyStore<T> {
    /// Build the store described by `config`.
    ///
    /// # Errors
    /// Returns `Error::NotImplemented` for a remote config without the
    /// `remote` feature, or `Error::ConfigError` if the client cannot be built
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        match config {
            StoreConfig::InMemory { latency_ms } => {
                info!(
                    "Using in-memory {} store (latency {} ms)",
                    T::kind(),
                    latency_ms
                );
                Ok(AnyStore::InMemory(
                    InMemoryStore::new().with_latency(LatencyPolicy::from_millis(*latency_ms)),
                ))
            }
            #[cfg(feature = "remote")]
            StoreConfig::Remote(settings) => {
                info!("Using remote {} store at {}", T::kind(), settings.base_url);
                Ok(AnyStore::Remote(RemoteStore::new(RemoteConfig::from(
                    settings,
                ))?))
            }
            #[cfg(not(feature = "remote"))]
            StoreConfig::Remote(_) => Err(crate::error::Error::NotImplemented(
                "remote store requires the 'remote' feature".to_string(),
            )),
        }
    }
}

impl<T: Record> RecordStore<T> for AnyStore<T> {
    async fn fetch_all(&self) -> Result<Vec<T>> {
        match self {
            AnyStore::InMemory(store) => store.fetch_all().await,
            #[cfg(feature = "remote")]
            AnyStore::Remote(store) => store.fetch_all().await,
        }
    }

    async fn fetch_by_id(&self, id: RecordId) -> Result<T> {
        match self {
            AnyStore::InMemory(store) => store.fetch_by_id(id).await,
            #[cfg(feature = "remote")]
            AnyStore::Remote(store) => store.fetch_by_id(id).await,
        }
    }

    async fn create(&self, record: T) -> Result<T> {
        match self {
            AnyStore::InMemory(store) => store.create(record).await,
            #[cfg(feature = "remote")]
            AnyStore::Remote(store) => store.create(record).await,
        }
    }

    async fn update(&self, id: RecordId, patch: &T::Patch) -> Result<T> {
        match self {
            AnyStore::InMemory(store) => store.update(id, patch).await,
            #[cfg(feature = "remote")]
            AnyStore::Remote(store) => store.update(id, patch).await,
        }
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        match self {
            AnyStore::InMemory(store) => store.delete(id).await,
            #[cfg(feature = "remote")]
            AnyStore::Remote(store) => store.delete(id).await,
        }
    }

    async fn count(&self) -> Result<usize> {
        match self {
            AnyStore::InMemory(store) => store.count().await,
            #[cfg(feature = "remote")]
            AnyStore::Remote(store) => store.count().await,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        match self {
            AnyStore::InMemory(store) => store.health_check().await,
            #[cfg(feature = "remote")]
            AnyStore::Remote(store) => store.health_check().await,
        }
    }
}

/// One store per entity kind, all built from the same configuration.
#[derive(Clone)]
pub struct StoreSet {
    pub events: AnyStore<Event>,
    pub invoices: AnyStore<Invoice>,
    pub menu_items: AnyStore<MenuItem>,
}

impl StoreSet {
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Ok(StoreSet {
            events: AnyStore::from_config(config)?,
            invoices: AnyStore::from_config(config)?,
            menu_items: AnyStore::from_config(config)?,
        })
    }
}
