//! Export-condition resolution for pakt.
//!
//! Turns a package manifest and a source tree into the entry table the rest
//! of the build consumes:
//!
//! 1. [`resolve_wildcard_exports`] expands `"./features/*"` style keys
//!    against the files that actually exist.
//! 2. [`parse_exports`] / [`parse_exports_tree`] flatten `exports`, `bin`,
//!    `main`, `module` and `types` into [`ParsedExportsInfo`].
//! 3. [`collect_entries`] matches every export path to a source file,
//!    including environment variants such as `index.development.ts`.
//!
//! All file-system access goes through the [`Runtime`] trait.

pub mod collector;
pub mod conditions;
pub mod export_path;
pub mod manifest;
pub mod parser;
pub mod runtime;
pub mod warning;
pub mod wildcard;

pub use collector::{CollectedEntries, Entries, Entry, collect_entries, validate_entry_files};
pub use conditions::{
    ConditionChain, PackageType, RUNTIME_CONDITIONS, SOURCE_EXTENSIONS, SPECIAL_CONDITIONS,
    export_type_from_file,
};
pub use export_path::{
    BINARY_TAG, entry_key, is_binary_path, normalize_export_path, public_specifier,
    special_condition_of,
};
pub use manifest::{ExportsNode, PackageJson};
pub use parser::{ExportTarget, ParsedExports, ParsedExportsInfo, parse_exports, parse_exports_tree};
#[cfg(not(target_family = "wasm"))]
pub use runtime::native::NativeRuntime;
pub use runtime::{FileMetadata, Runtime, RuntimeError, RuntimeResult};
pub use warning::Warning;
pub use wildcard::{expand_wildcard, resolve_wildcard_exports};

/// Errors produced while resolving entries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest could not be read or parsed.
    #[error("Invalid package.json: {0}")]
    InvalidManifest(String),

    /// Two source files map to the same export identity.
    #[error("Conflicted entry files found for entries: {}", .paths.join(", "))]
    ConflictingEntries { paths: Vec<String> },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, Error>;
