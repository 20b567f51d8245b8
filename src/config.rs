//! Application configuration: TOML file plus environment overrides.
//!
//! ```toml
//! [store]
//! backend = "remote"
//! base_url = "https://records.example.com"
//! project_id = "catering"
//! public_key = "pk_live_123"
//! timeout_secs = 10
//!
//! [reports]
//! month_ordering = "chronological"
//! default_range = 6
//! ```
//!
//! Environment variables win over the file:
//!
//! | Variable                    | Effect                                   |
//! |-----------------------------|------------------------------------------|
//! | `CATERING_STORE_BACKEND`    | `inmemory` or `remote`                   |
//! | `CATERING_STORE_LATENCY_MS` | artificial in-memory latency             |
//! | `CATERING_STORE_URL`        | remote base URL                          |
//! | `CATERING_PROJECT_ID`       | remote project id                        |
//! | `CATERING_PUBLIC_KEY`       | remote public key                        |
//! | `CATERING_MONTH_ORDERING`   | `chronological` or `lexical`             |

use crate::error::{Error, Result};
use crate::report::{MonthOrdering, ReportRange};
use serde::Deserialize;
use std::path::Path;

pub const ENV_BACKEND: &str = "CATERING_STORE_BACKEND";
pub const ENV_LATENCY_MS: &str = "CATERING_STORE_LATENCY_MS";
pub const ENV_STORE_URL: &str = "CATERING_STORE_URL";
pub const ENV_PROJECT_ID: &str = "CATERING_PROJECT_ID";
pub const ENV_PUBLIC_KEY: &str = "CATERING_PUBLIC_KEY";
pub const ENV_MONTH_ORDERING: &str = "CATERING_MONTH_ORDERING";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub reports: ReportConfig,
}

/// Which record store backs every entity kind.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    InMemory {
        #[serde(default)]
        latency_ms: u64,
    },
    Remote(RemoteSettings),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::InMemory { latency_ms: 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RemoteSettings {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub month_ordering: MonthOrdering,
    pub default_range: ReportRange,
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// File if given (defaults otherwise), then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()
    }

    /// Apply `CATERING_*` variables from the process environment.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for unparsable values or when switching to
    /// the remote backend without a URL, project id and public key.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.store = match backend.trim().to_ascii_lowercase().as_str() {
                "inmemory" => match self.store {
                    keep @ StoreConfig::InMemory { .. } => keep,
                    StoreConfig::Remote(_) => StoreConfig::default(),
                },
                "remote" => match self.store {
                    keep @ StoreConfig::Remote(_) => keep,
                    StoreConfig::InMemory { .. } => {
                        let required = |name: &str| {
                            lookup(name).ok_or_else(|| {
                                Error::ConfigError(format!(
                                    "{}=remote requires {}",
                                    ENV_BACKEND, name
                                ))
                            })
                        };
                        StoreConfig::Remote(RemoteSettings {
                            base_url: required(ENV_STORE_URL)?,
                            project_id: required(ENV_PROJECT_ID)?,
                            public_key: required(ENV_PUBLIC_KEY)?,
                            timeout_secs: None,
                        })
                    }
                },
                other => {
                    return Err(Error::ConfigError(format!(
                        "{}: unknown backend '{}'",
                        ENV_BACKEND, other
                    )))
                }
            };
        }

        match &mut self.store {
            StoreConfig::InMemory { latency_ms } => {
                if let Some(value) = lookup(ENV_LATENCY_MS) {
                    *latency_ms = value.trim().parse().map_err(|_| {
                        Error::ConfigError(format!("{}: not a number: {}", ENV_LATENCY_MS, value))
                    })?;
                }
            }
            StoreConfig::Remote(settings) => {
                if let Some(url) = lookup(ENV_STORE_URL) {
                    settings.base_url = url;
                }
                if let Some(project_id) = lookup(ENV_PROJECT_ID) {
                    settings.project_id = project_id;
                }
                if let Some(public_key) = lookup(ENV_PUBLIC_KEY) {
                    settings.public_key = public_key;
                }
            }
        }

        if let Some(ordering) = lookup(ENV_MONTH_ORDERING) {
            self.reports.month_ordering = ordering.parse()?;
        }

        Ok(self)
    }
}
