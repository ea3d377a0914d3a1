//! Builder options, loaded from JSON.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::MAX_BUFFER_SIZE;

pub const BUILTIN_BUILDER_OPTIONS: &str = include_str!("data/builder_options.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Bytes reserved up front; the buffer doubles when it runs out.
    pub initial_capacity: usize,
    /// Write scalar fields that equal their declared default.
    pub force_defaults: bool,
    /// Hard cap on a finished buffer, clamped to the format limit.
    pub max_buffer_size: usize,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            force_defaults: false,
            max_buffer_size: MAX_BUFFER_SIZE,
        }
    }
}

impl BuilderOptions {
    /// Options tuned for recording whole matches.
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_BUILDER_OPTIONS).expect("builtin builder options should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}
