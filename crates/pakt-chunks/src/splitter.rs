//! Chunk boundary splitting.
//!
//! [`ChunkSplitter::manual_chunks`] is called by the bundling engine once per
//! module and answers with a chunk group name, or `None` to leave the module
//! where the engine's default algorithm puts it. A module is split out when:
//!
//! - it matches the shared-helper pattern (one constant chunk),
//! - its file name declares a custom runtime layer,
//! - it has no layer of its own but is imported from more than one layer
//!   (shared chunk named after the joined layer set), or
//! - it has its own layer and is reachable from an entry of another layer
//!   (boundary chunk named after its own layer).
//!
//! All state lives in the splitter and is scoped to one build pass.

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

use crate::graph::{ModuleGraphContext, ModuleInfo};
use crate::layer::{custom_layer_from_file, layer_hash, module_layer};

/// Default shared-helper pattern: SWC's runtime helper package.
pub const DEFAULT_SHARED_HELPERS_PATTERN: &str = r"[\\/]node_modules[\\/]@swc[\\/]helpers[\\/]";

/// Default chunk group for shared helpers.
pub const DEFAULT_SHARED_HELPERS_CHUNK: &str = "runtime-helpers";

#[derive(Debug, Clone)]
pub struct SplitterOptions {
    /// Modules matching this pattern always go to `shared_helpers_chunk`.
    pub shared_helpers: Option<Regex>,
    pub shared_helpers_chunk: String,
}

impl SplitterOptions {
    pub fn new(pattern: &str, chunk: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            shared_helpers: Some(Regex::new(pattern)?),
            shared_helpers_chunk: chunk.into(),
        })
    }
}

impl Default for SplitterOptions {
    fn default() -> Self {
        Self {
            shared_helpers: Regex::new(DEFAULT_SHARED_HELPERS_PATTERN).ok(),
            shared_helpers_chunk: DEFAULT_SHARED_HELPERS_CHUNK.to_string(),
        }
    }
}

/// One entry reaching a module: the entry's id and its layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryRecord {
    pub entry: String,
    pub layer: Option<String>,
}

/// Module id → entries that reach it. Append-only within a pass.
pub type DependencyGraphMap = FxHashMap<String, Vec<EntryRecord>>;

/// Module id → assigned chunk group. Never invalidated within a pass.
pub type ChunkGroupMap = FxHashMap<String, String>;

#[derive(Debug, Default)]
pub struct ChunkSplitter {
    options: SplitterOptions,
    dependency_graph: DependencyGraphMap,
    chunk_groups: ChunkGroupMap,
    effective_layers: FxHashMap<String, BTreeSet<String>>,
    seeded: bool,
}

impl ChunkSplitter {
    pub fn new(options: SplitterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Chunk group for `id`, or `None` to leave placement to the engine.
    ///
    /// Repeated calls for the same module return the same answer.
    pub fn manual_chunks(&mut self, id: &str, ctx: &dyn ModuleGraphContext) -> Option<String> {
        if let Some(group) = self.chunk_groups.get(id) {
            return Some(group.clone());
        }

        let info = ctx.module_info(id)?;
        self.seed_entries(ctx);

        if info.is_entry {
            return None;
        }

        if self
            .options
            .shared_helpers
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(id))
        {
            let chunk = self.options.shared_helpers_chunk.clone();
            return Some(self.assign(id, chunk));
        }

        if let Some(custom) = custom_layer_from_file(id) {
            return Some(self.assign(id, custom.chunk_name()));
        }

        match module_layer(&info.meta) {
            None => self.split_shared(info, ctx),
            Some(layer) => self.split_boundary(info, &layer),
        }
    }

    /// Entries recorded for `id` while seeding.
    pub fn records(&self, id: &str) -> &[EntryRecord] {
        self.dependency_graph
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Chunk groups assigned so far.
    pub fn assignments(&self) -> &ChunkGroupMap {
        &self.chunk_groups
    }

    fn assign(&mut self, id: &str, chunk: String) -> String {
        tracing::debug!(module = id, chunk = %chunk, "assigned chunk group");
        self.chunk_groups.insert(id.to_string(), chunk.clone());
        chunk
    }

    /// Shared dependency without a layer of its own: split only when its
    /// importers span more than one layer.
    fn split_shared(&mut self, info: &ModuleInfo, ctx: &dyn ModuleGraphContext) -> Option<String> {
        let layers = self.effective_layers(&info.id, ctx);
        if layers.len() < 2 {
            return None;
        }

        let joined = layers.into_iter().collect::<Vec<_>>().join("-");
        let chunk = format!("{}-{}", module_name(&info.id), layer_hash(&joined));
        Some(self.assign(&info.id, chunk))
    }

    /// Layered module: split when some entry of another layer reaches it,
    /// unless every such entry reaches it through a same-layer entry.
    fn split_boundary(&mut self, info: &ModuleInfo, layer: &str) -> Option<String> {
        let records = self.records(&info.id);
        if records.is_empty() {
            return None;
        }
        if records
            .iter()
            .all(|record| record.layer.as_deref() == Some(layer))
        {
            return None;
        }
        if self.is_import_from_other_entry(records, layer) {
            tracing::trace!(module = %info.id, "covered by another entry's chunk");
            return None;
        }

        let chunk = format!("{}-{}", module_name(&info.id), layer_hash(layer));
        Some(self.assign(&info.id, chunk))
    }

    /// Whether each entry of a different layer reaching the module also
    /// reaches one of the module's same-layer entries, which then carries it.
    fn is_import_from_other_entry(&self, records: &[EntryRecord], layer: &str) -> bool {
        let (same, other): (Vec<&EntryRecord>, Vec<&EntryRecord>) = records
            .iter()
            .partition(|record| record.layer.as_deref() == Some(layer));

        !other.is_empty()
            && other.iter().all(|outer| {
                same.iter().any(|inner| {
                    self.records(&inner.entry)
                        .iter()
                        .any(|reaching| reaching.entry == outer.entry)
                })
            })
    }

    /// Record every module reachable from every entry, once per pass.
    fn seed_entries(&mut self, ctx: &dyn ModuleGraphContext) {
        if self.seeded {
            return;
        }
        self.seeded = true;

        for id in ctx.module_ids() {
            let Some(entry) = ctx.module_info(id) else {
                continue;
            };
            if entry.is_entry {
                self.seed_entry(entry, ctx);
            }
        }
        tracing::debug!(modules = self.dependency_graph.len(), "seeded entry reachability");
    }

    fn seed_entry(&mut self, entry: &ModuleInfo, ctx: &dyn ModuleGraphContext) {
        let layer = own_layer(entry);
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut stack: Vec<&str> = entry.imported_ids.iter().map(String::as_str).collect();
        visited.insert(entry.id.as_str());

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            let record = EntryRecord {
                entry: entry.id.clone(),
                layer: layer.clone(),
            };
            let bucket = self.dependency_graph.entry(id.to_string()).or_default();
            if !bucket.contains(&record) {
                bucket.push(record);
            }

            if let Some(module) = ctx.module_info(id) {
                stack.extend(module.imported_ids.iter().map(String::as_str));
            }
        }
    }

    /// Distinct layers a module executes in: its own, or the union of its
    /// importers' effective layers.
    fn effective_layers(&mut self, id: &str, ctx: &dyn ModuleGraphContext) -> BTreeSet<String> {
        if let Some(layers) = self.effective_layers.get(id) {
            return layers.clone();
        }

        let mut visiting = FxHashSet::default();
        let (layers, _) = self.resolve_effective_layers(id, ctx, &mut visiting);
        // the outermost query sees every upward path, so it is always complete
        self.effective_layers.insert(id.to_string(), layers.clone());
        layers
    }

    /// Returns the layers plus whether the walk was cut short by a cycle.
    fn resolve_effective_layers(
        &mut self,
        id: &str,
        ctx: &dyn ModuleGraphContext,
        visiting: &mut FxHashSet<String>,
    ) -> (BTreeSet<String>, bool) {
        if let Some(layers) = self.effective_layers.get(id) {
            return (layers.clone(), true);
        }
        let Some(info) = ctx.module_info(id) else {
            return (BTreeSet::new(), true);
        };

        if let Some(layer) = own_layer(info) {
            let layers = BTreeSet::from([layer]);
            self.effective_layers.insert(id.to_string(), layers.clone());
            return (layers, true);
        }

        if !visiting.insert(id.to_string()) {
            return (BTreeSet::new(), false);
        }

        let mut layers = BTreeSet::new();
        let mut complete = true;
        for importer in &info.importers {
            let (inherited, importer_complete) =
                self.resolve_effective_layers(importer, ctx, visiting);
            layers.extend(inherited);
            complete &= importer_complete;
        }
        visiting.remove(id);

        if complete {
            self.effective_layers.insert(id.to_string(), layers.clone());
        }
        (layers, complete)
    }
}

/// Custom runtime layer from the file name, else the directive layer.
fn own_layer(info: &ModuleInfo) -> Option<String> {
    custom_layer_from_file(&info.id)
        .map(|custom| custom.layer)
        .or_else(|| module_layer(&info.meta))
}

/// File name without extension, reduced to filename-safe characters.
fn module_name(id: &str) -> String {
    let basename = id.rsplit(['/', '\\']).next().unwrap_or(id);
    let stem = match basename.rfind('.') {
        Some(dot) if dot > 0 => &basename[..dot],
        _ => basename,
    };
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
