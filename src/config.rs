use std::{fs, path::Path};

use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

use crate::{listener_tree::PassOrder, store::StoreError, value::Value};

/// Settings for building a [`Store`](crate::Store).
///
/// ```toml
/// pass_order = "ancestors_first"
///
/// [initial]
/// theme = "dark"
///
/// [initial.user]
/// name = "Ann"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Order of the subtree and ancestor passes for scoped writes.
    pub pass_order: PassOrder,
    /// Starting root. An empty mapping when absent.
    #[serde(deserialize_with = "deserialize_initial")]
    pub initial: Option<Value>,
}

/// Reads `initial` through `toml::Value` so TOML-only scalars such as
/// datetimes land as strings, the same way documents loaded by the CLI do.
fn deserialize_initial<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<toml::Value>::deserialize(deserializer)?;
    Ok(raw.map(Value::from))
}

impl StoreConfig {
    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    /// * `StoreError::Config` - If the TOML is malformed or has unknown fields
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        toml::from_str(content).map_err(|e| StoreError::Config {
            location: "string".to_string(),
            details: e.to_string(),
        })
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// * `StoreError::Config` - If the file cannot be read or parsed
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let location = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|e| StoreError::Config {
            location: location.clone(),
            details: e.to_string(),
        })?;

        let config = toml::from_str(&content).map_err(|e| StoreError::Config {
            location,
            details: e.to_string(),
        })?;

        debug!("loaded store config");
        Ok(config)
    }
}
