//! Config schema types (network channel-mask settings, device config store).

use std::{path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChMaskConfig {
    pub network: NetworkConfig,
    pub store: StoreConfig,
}

/// Channel-mask evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Algorithm used when the caller does not name one.
    pub chmask_algorithm: String,

    /// Wall-clock budget for a single algorithm invocation, in milliseconds.
    pub chmask_timeout_ms: u64,

    /// Newest uplink history entries handed to algorithms.
    pub max_uplink_history: usize,

    /// Fixed-mask algorithms registered next to the built-in ones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixed_masks: Vec<FixedMaskEntry>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chmask_algorithm: "default".into(),
            chmask_timeout_ms: 100,
            max_uplink_history: 20,
            fixed_masks: Vec::new(),
        }
    }
}

/// A fixed-mask algorithm declared in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedMaskEntry {
    pub id: String,
    pub name: String,
    pub channels: Vec<usize>,
}

/// Where per-device channel-mask overrides are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// File for the `json` and `sqlite` backends. Defaults to a file in the
    /// data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Json,
    Sqlite,
}

impl StoreBackend {
    /// File name used when no explicit path is configured.
    pub fn default_file_name(&self) -> Option<&'static str> {
        match self {
            StoreBackend::Memory => None,
            StoreBackend::Json => Some("device_config_store.json"),
            StoreBackend::Sqlite => Some("device_config_store.db"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!(
                "unknown store backend {other:?}, expected memory, json or sqlite"
            )),
        }
    }
}
