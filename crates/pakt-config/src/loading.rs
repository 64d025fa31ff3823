use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{PaktConfig, snake_case_keys};
use crate::error::{ConfigError, Result};

/// Config file looked up in the package root.
pub const CONFIG_FILE: &str = "pakt.toml";

/// `package.json` field holding inline configuration.
pub const PACKAGE_JSON_FIELD: &str = "pakt";

const ENV_PREFIX: &str = "PAKT_";

const KNOWN_KEYS: &[&str] = &[
    "cwd",
    "source_dir",
    "formats",
    "dts",
    "shared_helpers_chunk",
    "shared_helpers_pattern",
    "log_level",
    "external",
];

/// Where the file-based layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Toml(PathBuf),
    PackageJson(PathBuf),
    Defaults,
}

impl PaktConfig {
    /// Load configuration for the package rooted at `root`.
    /// Priority: environment variables > pakt.toml or package.json#pakt > defaults
    pub fn load(root: &Path) -> Result<Self> {
        let (figment, source) = Self::figment(root)?;
        tracing::debug!(?source, "loading configuration");

        let config: PaktConfig = figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: "configuration".to_string(),
            value: e.to_string(),
            hint: format!("Check {} syntax and field types", CONFIG_FILE),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The merged provider stack, before extraction.
    pub fn figment(root: &Path) -> Result<(Figment, ConfigSource)> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default_config()));

        let toml_path = root.join(CONFIG_FILE);
        let source = if toml_path.is_file() {
            figment = figment.merge(Toml::file(&toml_path));
            ConfigSource::Toml(toml_path)
        } else if let Some(section) = package_json_section(root)? {
            figment = figment.merge(Serialized::defaults(snake_case_keys(section)));
            ConfigSource::PackageJson(root.join("package.json"))
        } else {
            ConfigSource::Defaults
        };

        // PAKT_SOURCE_DIR, PAKT_DTS, PAKT_LOG_LEVEL, ...
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX).filter(|key| {
                KNOWN_KEYS
                    .iter()
                    .any(|known| key.as_str().eq_ignore_ascii_case(known))
            }),
        );

        Ok((figment, source))
    }
}

/// The `pakt` object of `root/package.json`, if present.
fn package_json_section(root: &Path) -> Result<Option<Value>> {
    let path = root.join("package.json");
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let mut parsed: Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
            field: "package.json".to_string(),
            value: e.to_string(),
            hint: "package.json must be valid JSON".to_string(),
        })?;

    match parsed.get_mut(PACKAGE_JSON_FIELD).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(section @ Value::Object(_)) => Ok(Some(section)),
        Some(other) => Err(ConfigError::InvalidValue {
            field: PACKAGE_JSON_FIELD.to_string(),
            value: other.to_string(),
            hint: "The 'pakt' field must be an object".to_string(),
        }),
    }
}
