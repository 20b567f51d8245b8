//! Remote record store speaking a generic JSON record-service protocol.
//!
//! Every operation is a `POST {base_url}/records/{kind}/{action}` carrying the
//! project id and public key as headers:
//!
//! | Operation     | Action      | Body                                  |
//! |---------------|-------------|---------------------------------------|
//! | `fetch_all`   | `fetch`     | `{"fields": [..], "orderBy": [..]}`   |
//! | `fetch_by_id` | `get/{id}`  | `{"fields": [..]}`                    |
//! | `create`      | `create`    | `{"records": [{..}]}`                 |
//! | `update`      | `update`    | `{"records": [{"Id": id, ..}]}`       |
//! | `delete`      | `delete`    | `{"RecordIds": [id]}`                 |
//!
//! Responses share one envelope:
//! `{"success": bool, "message": str?, "data": any?, "results": [{"success", "message", "data"}]}`.
//!
//! Every inbound record is checked against the kind's `Schema` before typed
//! decoding.

use super::RecordStore;
use crate::config::RemoteSettings;
use crate::error::{Error, Result};
use crate::key::RecordKeyBuilder;
use crate::record::{sort_canonical, Record, RecordId};
use crate::schema::ID_FIELD;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub const PROJECT_HEADER: &str = "X-Project-Id";
pub const PUBLIC_KEY_HEADER: &str = "X-Public-Key";

/// Connection settings for a remote record service.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl RemoteConfig {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        RemoteConfig {
            base_url: base_url.into(),
            project_id: project_id.into(),
            public_key: public_key.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl From<&RemoteSettings> for RemoteConfig {
    fn from(settings: &RemoteSettings) -> Self {
        RemoteConfig {
            base_url: settings.base_url.clone(),
            project_id: settings.project_id.clone(),
            public_key: settings.public_key.clone(),
            timeout: settings.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    results: Vec<RecordResult>,
}

#[derive(Debug, Deserialize)]
struct RecordResult {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Record store backed by a remote JSON record service.
///
/// # Example
///
/// ```no_run
/// # use catering_kit::store::{RemoteConfig, RemoteStore, RecordStore};
/// # use catering_kit::model::Event;
/// # async fn example() -> catering_kit::Result<()> {
/// let config = RemoteConfig::new("https://records.example.com", "project-1", "pk_live");
/// let events = RemoteStore::<Event>::new(config)?;
///
/// let upcoming = events.fetch_all().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RemoteStore<T: Record> {
    client: reqwest::Client,
    config: Arc<RemoteConfig>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> RemoteStore<T> {
    /// Create a remote store.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for an empty base URL or if the HTTP
    /// client cannot be built
    pub fn new(config: RemoteConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::ConfigError(
                "remote store base_url must not be empty".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(RemoteStore {
            client,
            config: Arc::new(config),
            _marker: PhantomData,
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/records/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            T::kind(),
            action
        )
    }

    /// POST a request and map the HTTP status onto the error taxonomy.
    ///
    /// A 404 becomes `NotFound` when `id` is given.
    async fn send(&self, action: &str, body: Value, id: Option<RecordId>) -> Result<ResponseEnvelope> {
        let url = self.endpoint(action);
        let response = self
            .client
            .post(&url)
            .header(PROJECT_HEADER, self.config.project_id.as_str())
            .header(PUBLIC_KEY_HEADER, self.config.public_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("✗ Remote {} failed: {}", url, e);
                Error::StoreUnavailable(format!("{}: {}", url, e))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            error!("✗ Remote {} returned {}", url, status);
            return Err(match id {
                Some(id) => Error::NotFound {
                    kind: T::kind(),
                    id,
                },
                None => Error::StoreUnavailable(format!("{} returned {}", url, status)),
            });
        }
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = response
                .json::<ResponseEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| status.to_string());
            error!("✗ Remote {} rejected with {}: {}", url, status, message);
            return Err(Error::ValidationError(message));
        }
        if !status.is_success() {
            error!("✗ Remote {} returned {}", url, status);
            return Err(Error::StoreUnavailable(format!("{} returned {}", url, status)));
        }

        let envelope: ResponseEnvelope = response
            .json()
            .await
            .map_err(|e| Error::DeserializationError(format!("{}: {}", url, e)))?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string());
            error!("✗ Remote {} rejected: {}", url, message);
            return Err(Error::StoreUnavailable(message));
        }

        Ok(envelope)
    }

    fn decode(value: Value) -> Result<T> {
        T::schema().check_record(&value)?;
        serde_json::from_value(value)
            .map_err(|e| Error::ValidationError(format!("{}: {}", T::kind(), e)))
    }

    fn encode(record: &T) -> Result<Map<String, Value>> {
        match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::SerializationError(format!(
                "{} encoded to a non-object: {}",
                T::kind(),
                other
            ))),
        }
    }

    /// The single per-record result of a create or update.
    fn written_record(envelope: ResponseEnvelope, key: &str) -> Result<T> {
        let result = envelope.results.into_iter().next().ok_or_else(|| {
            Error::StoreUnavailable(format!("{}: store returned no result", key))
        })?;
        if !result.success {
            return Err(Error::ValidationError(
                result
                    .message
                    .unwrap_or_else(|| format!("{}: record rejected", key)),
            ));
        }
        let data = result.data.ok_or_else(|| {
            Error::StoreUnavailable(format!("{}: store returned no record", key))
        })?;
        Self::decode(data)
    }
}

impl<T: Record> RecordStore<T> for RemoteStore<T> {
    async fn fetch_all(&self) -> Result<Vec<T>> {
        let schema = T::schema();
        let body = json!({
            "fields": schema.field_names(),
            "orderBy": [{
                "fieldName": schema.order_by.field,
                "sorttype": schema.order_by.direction.as_str(),
            }],
        });

        let envelope = self.send("fetch", body, None).await?;
        let rows = match envelope.data {
            None => Vec::new(),
            Some(Value::Array(rows)) => rows,
            Some(other) => {
                return Err(Error::DeserializationError(format!(
                    "{}: expected a list of records, got {}",
                    T::kind(),
                    other
                )))
            }
        };

        let mut records = rows
            .into_iter()
            .map(Self::decode)
            .collect::<Result<Vec<T>>>()?;
        sort_canonical(&mut records);

        debug!("✓ Remote FETCH_ALL {} -> {} records", T::kind(), records.len());
        Ok(records)
    }

    async fn fetch_by_id(&self, id: RecordId) -> Result<T> {
        let key = RecordKeyBuilder::build::<T>(id);
        let body = json!({ "fields": T::schema().field_names() });

        let envelope = self.send(&format!("get/{}", id), body, Some(id)).await?;
        match envelope.data {
            Some(data) if !data.is_null() => {
                debug!("✓ Remote GET {} -> HIT", key);
                Self::decode(data)
            }
            _ => {
                debug!("✓ Remote GET {} -> MISS", key);
                Err(Error::NotFound {
                    kind: T::kind(),
                    id,
                })
            }
        }
    }

    async fn create(&self, record: T) -> Result<T> {
        record.validate()?;
        let mut fields = Self::encode(&record)?;
        fields.remove(ID_FIELD);

        let envelope = self
            .send("create", json!({ "records": [fields] }), None)
            .await?;
        let created = Self::written_record(envelope, T::kind())?;

        debug!(
            "✓ Remote CREATE {}",
            RecordKeyBuilder::build::<T>(created.id())
        );
        Ok(created)
    }

    /// Applies the patch to the current record locally, then writes the whole
    /// record so derived fields stay consistent.
    async fn update(&self, id: RecordId, patch: &T::Patch) -> Result<T> {
        let key = RecordKeyBuilder::build::<T>(id);
        let mut record = self.fetch_by_id(id).await?;
        record.apply_patch(patch);
        record.assign_id(id);
        record.validate()?;

        let fields = Self::encode(&record)?;
        let envelope = self
            .send("update", json!({ "records": [fields] }), Some(id))
            .await?;
        let updated = Self::written_record(envelope, &key)?;

        debug!("✓ Remote UPDATE {}", key);
        Ok(updated)
    }

    async fn delete(&self, id: RecordId) -> Result<()> {
        let key = RecordKeyBuilder::build::<T>(id);
        let envelope = self
            .send("delete", json!({ "RecordIds": [id] }), Some(id))
            .await?;

        match envelope.results.first() {
            Some(result) if !result.success => {
                debug!("✓ Remote DELETE {} -> MISS", key);
                Err(Error::NotFound {
                    kind: T::kind(),
                    id,
                })
            }
            _ => {
                debug!("✓ Remote DELETE {}", key);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.config.base_url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Remote store health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
