//! Platform runtime abstraction for entry collection
//!
//! This module defines the `Runtime` trait that abstracts the file-system
//! operations the export resolver needs: probing for source files, listing
//! directories during wildcard expansion, and reading `package.json`.
//! Hosts can substitute an in-memory or remote implementation without
//! touching the resolution logic.

#[cfg(not(target_family = "wasm"))]
pub mod native;

// fixture-backed runtime for this crate's tests and downstream integration tests
#[cfg(any(
    all(any(test, doctest), not(target_family = "wasm")),
    all(feature = "test-utils", not(target_family = "wasm"))
))]
pub mod test_utils;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result of a file-system query.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// File-system failures surfaced to the resolver.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The path does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Any other I/O failure, with context.
    #[error("I/O error: {0}")]
    Io(String),

    /// Host-specific failure (task join, sandbox denial, ...).
    #[error("Runtime error: {0}")]
    Other(String),
}

/// What the resolver needs to know about a path.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Size in bytes; checked against the manifest size cap.
    pub size: u64,
    pub is_dir: bool,
    pub is_file: bool,
}

/// Everything the resolver learns about the source tree flows through this
/// trait. Implementations must be safe to share across the concurrent
/// per-export-path probes, hence `Send + Sync`.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a whole file.
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Cheap existence probe, used before listing wildcard bases.
    fn exists(&self, path: &Path) -> bool;

    /// Read a directory, returning the entry names (not full paths)
    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<String>>;

    fn get_cwd(&self) -> RuntimeResult<PathBuf>;

    /// Whether `path` exists and is a regular file.
    ///
    /// Lookup failures count as "not a file": the collector treats an
    /// unreadable candidate exactly like a missing one.
    async fn is_file(&self, path: &Path) -> bool {
        matches!(self.metadata(path).await, Ok(meta) if meta.is_file)
    }

    /// Whether `path` exists and is a directory.
    async fn is_dir(&self, path: &Path) -> bool {
        matches!(self.metadata(path).await, Ok(meta) if meta.is_dir)
    }
}
