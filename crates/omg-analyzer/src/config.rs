//! Validator configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the standard rule set.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolver method names that are always defined.
pub const BUILTIN_RESOLVERS: &[&str] = &["exact", "fuzzy", "phonetic", "semantic", "regex", "custom"];

/// Errors raised while loading a [`ValidatorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid JSON for this schema.
    #[error("invalid validator config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Config result type alias.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Switches for the semantic validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Names accepted as references without a matching rule or import.
    pub builtin_resolvers: Vec<String>,
    /// Run the raw-text scans alongside the AST passes.
    pub raw_text_fallback: bool,
    /// Check that imported and optional-tokens files exist.
    pub check_files: bool,
    /// Drop diagnostics repeating an earlier one's span, code and message.
    pub deduplicate: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            builtin_resolvers: BUILTIN_RESOLVERS.iter().map(|s| s.to_string()).collect(),
            raw_text_fallback: true,
            check_files: true,
            deduplicate: true,
        }
    }
}

impl ValidatorConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtin_resolvers.iter().any(|b| b == name)
    }
}
