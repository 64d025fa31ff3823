#![cfg_attr(docsrs, feature(doc_cfg))]

//! # pakt-bundler
//!
//! Build-pass orchestration for pakt: derives what to build from a package
//! and decides how each pass shards its modules. Bundling itself is left to
//! the host engine, which receives the [`BuildPlan`] and calls back into a
//! [`BuildPass`] for chunk assignment.
//!
//! ```no_run
//! use pakt_bundler::{BuildContext, PaktConfig};
//! use pakt_exports::NativeRuntime;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = std::env::current_dir()?;
//! let config = PaktConfig::load(&root)?;
//! let plan = BuildContext::new(root, config, Arc::new(NativeRuntime::new()))
//!     .plan()
//!     .await?;
//!
//! for output in &plan.outputs {
//!     println!("{} -> {}", output.source.display(), output.output);
//! }
//! # Ok(()) }
//! ```

pub mod context;
pub mod output;
pub mod pass;
pub mod warnings;

pub use context::{BuildContext, BuildPlan, PreparedBuild};
pub use output::{OutputFile, OutputKind, dts_output_for, externals_for, plan_outputs};
pub use pass::BuildPass;
pub use warnings::Warnings;

pub use pakt_config::{Format, LogLevel, PaktConfig};

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{init_logging, init_logging_from_env};

use std::path::PathBuf;

/// Error types for pakt-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    Config(#[from] pakt_config::ConfigError),

    /// Entry resolution failed.
    #[error(transparent)]
    Exports(#[from] pakt_exports::Error),

    /// Nothing in the manifest resolved to a source file.
    #[error("No entry files found in {}", .source_dir.display())]
    NoEntries { source_dir: PathBuf },
}

/// Result type alias for pakt-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Config(_) => "INVALID_CONFIG",
            Error::Exports(pakt_exports::Error::InvalidManifest(_)) => "INVALID_MANIFEST",
            Error::Exports(pakt_exports::Error::ConflictingEntries { .. }) => "CONFLICTING_ENTRIES",
            Error::Exports(pakt_exports::Error::Runtime(_)) => "RUNTIME_ERROR",
            Error::NoEntries { .. } => "NO_ENTRIES",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Config(err) => Some(Box::new(format!(
                "Check pakt.toml, the \"pakt\" field of package.json and PAKT_* environment variables.\nError: {}",
                err
            ))),
            Error::Exports(pakt_exports::Error::InvalidManifest(_)) => Some(Box::new(
                "Make sure package.json exists in the package root and is valid JSON.",
            )),
            Error::Exports(pakt_exports::Error::ConflictingEntries { paths }) => {
                Some(Box::new(format!(
                    "Each export may have only one source file. Remove or rename one of the files for: {}",
                    paths.join(", ")
                )))
            }
            Error::NoEntries { source_dir } => Some(Box::new(format!(
                "Add \"exports\", \"main\" or \"bin\" to package.json and make sure the matching sources exist under {}.",
                source_dir.display()
            ))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn diagnostics_carry_codes_and_help() {
        let err = Error::from(pakt_exports::Error::ConflictingEntries {
            paths: vec!["./foo".to_string()],
        });
        assert_eq!(
            err.to_string(),
            "Conflicted entry files found for entries: ./foo"
        );
        assert_eq!(err.code().unwrap().to_string(), "CONFLICTING_ENTRIES");
        assert!(err.help().unwrap().to_string().contains("./foo"));

        let err = Error::NoEntries {
            source_dir: PathBuf::from("/pkg/src"),
        };
        assert_eq!(err.code().unwrap().to_string(), "NO_ENTRIES");
        assert_eq!(err.severity(), Some(miette::Severity::Error));
    }
}
