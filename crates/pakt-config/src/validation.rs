use regex::Regex;

use pakt_chunks::SplitterOptions;

use crate::config::PaktConfig;
use crate::error::{ConfigError, Result};

impl PaktConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            return Err(ConfigError::MissingField {
                field: "formats".to_string(),
                hint: "Provide at least one output format (esm, cjs)".to_string(),
            });
        }

        if self.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "source_dir".to_string(),
                hint: "Use \".\" to build from the package root".to_string(),
            });
        }

        validate_chunk_name(&self.shared_helpers_chunk)?;

        if let Err(e) = Regex::new(&self.shared_helpers_pattern) {
            return Err(ConfigError::InvalidValue {
                field: "shared_helpers_pattern".to_string(),
                value: self.shared_helpers_pattern.clone(),
                hint: e.to_string(),
            });
        }

        Ok(())
    }

    /// Splitter options described by this config.
    pub fn splitter_options(&self) -> Result<SplitterOptions> {
        SplitterOptions::new(&self.shared_helpers_pattern, self.shared_helpers_chunk.clone())
            .map_err(|e| ConfigError::InvalidValue {
                field: "shared_helpers_pattern".to_string(),
                value: self.shared_helpers_pattern.clone(),
                hint: e.to_string(),
            })
    }
}

/// Chunk names end up in file names: non-empty, no path separators.
pub fn validate_chunk_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: "shared_helpers_chunk".to_string(),
            hint: "Chunk name cannot be empty".to_string(),
        });
    }

    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\') || c.is_control()) {
        return Err(ConfigError::InvalidValue {
            field: "shared_helpers_chunk".to_string(),
            value: name.to_string(),
            hint: format!("Invalid character {:?} in chunk name", c),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(PaktConfig::default_config().validate().is_ok());
    }

    #[test]
    fn empty_formats_fail() {
        let err = PaktConfig {
            formats: vec![],
            ..PaktConfig::default_config()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field, .. } if field == "formats"));
    }

    #[test]
    fn empty_source_dir_fails() {
        assert!(
            PaktConfig {
                source_dir: PathBuf::new(),
                ..PaktConfig::default_config()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn bad_helper_pattern_fails() {
        let config = PaktConfig {
            shared_helpers_pattern: "node_modules/(".to_string(),
            ..PaktConfig::default_config()
        };
        assert!(config.validate().is_err());
        assert!(config.splitter_options().is_err());
    }

    #[test]
    fn chunk_names_are_checked() {
        assert!(validate_chunk_name("runtime-helpers").is_ok());
        assert!(validate_chunk_name("  ").is_err());
        assert!(validate_chunk_name("shared/helpers").is_err());
    }

    #[test]
    fn splitter_options_carry_chunk_name() {
        let config = PaktConfig {
            shared_helpers_chunk: "helpers".to_string(),
            ..PaktConfig::default_config()
        };
        let options = config.splitter_options().unwrap();
        assert_eq!(options.shared_helpers_chunk, "helpers");
        assert!(
            options
                .shared_helpers
                .unwrap()
                .is_match("/x/node_modules/@swc/helpers/esm/_extends.js")
        );
    }
}
