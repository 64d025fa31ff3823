//! Non-fatal findings produced while deriving entries.
//!
//! Warnings are returned alongside results instead of being logged at the
//! point of discovery, so the build pass can report them together once the
//! whole pipeline has run.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    /// A manifest field had a shape other than string or object.
    InvalidExportsField { field: String, found: String },

    /// An export path has no matching source file.
    MissingSource { export_path: String, output: String },

    /// The package's primary (`.`) entry has no source file.
    MissingPrimaryEntry { output: String },

    /// A wildcard export key could not be expanded.
    WildcardExpansion { pattern: String, reason: String },

    /// Two outputs of one export path resolve under the same condition chain.
    DuplicateCondition {
        export_path: String,
        chain: String,
        kept: String,
        ignored: String,
    },

    /// A nested condition was discarded to keep the chain well-formed.
    IgnoredCondition {
        export_path: String,
        condition: String,
        chain: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidExportsField { field, found } => write!(
                f,
                "\"{}\" must be a string or an object, found {}; no entries generated from it",
                field, found
            ),
            Warning::MissingSource {
                export_path,
                output,
            } => write!(
                f,
                "no source file found for export \"{}\" (output {})",
                export_path, output
            ),
            Warning::MissingPrimaryEntry { output } => write!(
                f,
                "no source file found for the main entry (output {})",
                output
            ),
            Warning::WildcardExpansion { pattern, reason } => {
                write!(f, "failed to expand export \"{}\": {}", pattern, reason)
            }
            Warning::DuplicateCondition {
                export_path,
                chain,
                kept,
                ignored,
            } => write!(
                f,
                "export \"{}\" maps \"{}\" to both {} and {}; keeping the first",
                export_path, chain, kept, ignored
            ),
            Warning::IgnoredCondition {
                export_path,
                condition,
                chain,
            } => write!(
                f,
                "ignoring condition \"{}\" under \"{}\" for export \"{}\"",
                condition, chain, export_path
            ),
        }
    }
}
