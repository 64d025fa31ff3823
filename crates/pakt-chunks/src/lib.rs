//! Directive-aware chunk splitting for pakt.
//!
//! Modules declare the execution boundary they belong to with a leading
//! directive (`"use client"`, `"use server"`, ...). [`ChunkSplitter`] uses
//! those layers to decide which modules must live in their own chunk so
//! that code never crosses a boundary unnoticed, while modules shared
//! between layers are deduplicated into one chunk.

pub mod directives;
pub mod graph;
pub mod layer;
pub mod splitter;

pub use directives::{directive_prologue, extract_directives};
pub use graph::{ModuleGraph, ModuleGraphContext, ModuleInfo};
pub use layer::{CustomLayer, ModuleMeta, custom_layer_from_file, layer_hash, module_layer};
pub use splitter::{
    ChunkGroupMap, ChunkSplitter, DEFAULT_SHARED_HELPERS_CHUNK, DEFAULT_SHARED_HELPERS_PATTERN,
    DependencyGraphMap, EntryRecord, SplitterOptions,
};
