//! Module graph as seen by the chunk splitter.
//!
//! The bundling engine owns the real graph; the splitter only needs to ask
//! about one module at a time through [`ModuleGraphContext`].
//! [`ModuleGraph`] is an in-memory implementation for hosts that hand the
//! graph over up front, and for tests.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

use crate::layer::ModuleMeta;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub id: String,
    pub is_entry: bool,
    pub meta: ModuleMeta,
    /// Modules that import this one.
    pub importers: Vec<String>,
    /// Modules this one imports, statically or dynamically.
    pub imported_ids: Vec<String>,
}

/// Read-only view of the engine's module graph.
pub trait ModuleGraphContext {
    fn module_info(&self, id: &str) -> Option<&ModuleInfo>;

    /// Every module id known to the engine, in discovery order.
    fn module_ids(&self) -> Vec<&str>;
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: IndexMap<String, ModuleInfo, FxBuildHasher>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a module's metadata, keeping its edges.
    pub fn add_module(&mut self, id: impl Into<String>, meta: ModuleMeta) -> &mut ModuleInfo {
        let module = self.ensure(id.into());
        module.meta = meta;
        module
    }

    pub fn add_entry(&mut self, id: impl Into<String>, meta: ModuleMeta) -> &mut ModuleInfo {
        let module = self.add_module(id, meta);
        module.is_entry = true;
        module
    }

    /// Record that `importer` imports `imported`. Unknown modules are
    /// created without metadata.
    pub fn add_import(&mut self, importer: &str, imported: &str) {
        let from = self.ensure(importer.to_string());
        if !from.imported_ids.iter().any(|id| id == imported) {
            from.imported_ids.push(imported.to_string());
        }
        let to = self.ensure(imported.to_string());
        if !to.importers.iter().any(|id| id == importer) {
            to.importers.push(importer.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values().filter(|module| module.is_entry)
    }

    fn ensure(&mut self, id: String) -> &mut ModuleInfo {
        self.modules.entry(id).or_insert_with_key(|id| ModuleInfo {
            id: id.clone(),
            ..ModuleInfo::default()
        })
    }
}

impl ModuleGraphContext for ModuleGraph {
    fn module_info(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(id)
    }

    fn module_ids(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }
}
