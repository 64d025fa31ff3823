//! The `PaktConfig` structure and its defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use pakt_chunks::{DEFAULT_SHARED_HELPERS_CHUNK, DEFAULT_SHARED_HELPERS_PATTERN};

use crate::error::{ConfigError, Result};
use crate::types::{Format, LogLevel};

/// Build configuration.
///
/// Keys are snake_case; the `pakt` section of `package.json` may also use
/// camelCase (`sourceDir`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaktConfig {
    /// Package root. Defaults to the directory the config was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Source root, relative to `cwd`.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Output formats to build; outputs in other formats are skipped.
    #[serde(default = "default_formats")]
    pub formats: Vec<Format>,

    /// Emit declaration files.
    #[serde(default)]
    pub dts: bool,

    #[serde(default = "default_shared_helpers_chunk")]
    pub shared_helpers_chunk: String,

    /// Regex matched against module ids.
    #[serde(default = "default_shared_helpers_pattern")]
    pub shared_helpers_pattern: String,

    #[serde(default)]
    pub log_level: LogLevel,

    /// Extra module specifiers to keep external.
    #[serde(default)]
    pub external: Vec<String>,
}

pub fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

pub fn default_formats() -> Vec<Format> {
    vec![Format::Esm, Format::Cjs]
}

pub fn default_shared_helpers_chunk() -> String {
    DEFAULT_SHARED_HELPERS_CHUNK.to_string()
}

pub fn default_shared_helpers_pattern() -> String {
    DEFAULT_SHARED_HELPERS_PATTERN.to_string()
}

impl Default for PaktConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl PaktConfig {
    pub fn default_config() -> Self {
        Self {
            cwd: None,
            source_dir: default_source_dir(),
            formats: default_formats(),
            dts: false,
            shared_helpers_chunk: default_shared_helpers_chunk(),
            shared_helpers_pattern: default_shared_helpers_pattern(),
            log_level: LogLevel::default(),
            external: Vec::new(),
        }
    }

    /// Create from a JSON value (programmatic config).
    ///
    /// ```
    /// use pakt_config::{Format, PaktConfig};
    /// use serde_json::json;
    ///
    /// let config = PaktConfig::from_value(json!({ "formats": ["esm"], "dts": true })).unwrap();
    /// assert_eq!(config.formats, vec![Format::Esm]);
    /// assert_eq!(config.source_dir.to_str(), Some("src"));
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(snake_case_keys(value)).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            value: e.to_string(),
            hint: "Check field names and types".to_string(),
        })
    }

    /// Package root: `cwd` if set (resolved against `base` when relative),
    /// else `base`.
    pub fn root(&self, base: &Path) -> PathBuf {
        match &self.cwd {
            Some(cwd) if cwd.is_absolute() => cwd.clone(),
            Some(cwd) => base.join(cwd),
            None => base.to_path_buf(),
        }
    }

    /// Absolute source root.
    pub fn source_root(&self, base: &Path) -> PathBuf {
        self.root(base).join(&self.source_dir)
    }
}

/// Rewrite top-level camelCase keys (`sourceDir`) to snake_case.
pub(crate) fn snake_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (to_snake_case(&key), value))
                .collect(),
        ),
        other => other,
    }
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
