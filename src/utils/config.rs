//! JSON-backed configuration structs.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::Result;

/// Load/save helpers for `serde` configuration types.
///
/// Implementors should use `#[serde(default)]` so partial documents fill the
/// missing fields from `Default`.
pub trait JsonConfig: Serialize + DeserializeOwned + Sized {
    fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
