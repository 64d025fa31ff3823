//! Per-pass chunk assignment.
//!
//! The engine bundles once per `(format, dts)` combination. Each pass owns a
//! fresh [`ChunkSplitter`], so memoized layers and chunk groups never leak
//! between passes.

use indexmap::IndexMap;

use pakt_chunks::{ChunkSplitter, ModuleGraphContext, SplitterOptions};
use pakt_config::{Format, PaktConfig};

use crate::Result;

#[derive(Debug)]
pub struct BuildPass {
    pub format: Format,
    pub dts: bool,
    splitter: ChunkSplitter,
}

impl BuildPass {
    pub fn new(format: Format, dts: bool, options: SplitterOptions) -> Self {
        Self {
            format,
            dts,
            splitter: ChunkSplitter::new(options),
        }
    }

    /// One pass per configured format, plus a declaration pass per format
    /// when `dts` is enabled.
    pub fn for_config(config: &PaktConfig) -> Result<Vec<BuildPass>> {
        let options = config.splitter_options()?;
        let mut passes: Vec<BuildPass> = config
            .formats
            .iter()
            .map(|&format| BuildPass::new(format, false, options.clone()))
            .collect();

        if config.dts {
            passes.extend(
                config
                    .formats
                    .iter()
                    .map(|&format| BuildPass::new(format, true, options.clone())),
            );
        }
        Ok(passes)
    }

    /// Engine callback: chunk group for one module.
    pub fn manual_chunks(&mut self, id: &str, ctx: &dyn ModuleGraphContext) -> Option<String> {
        self.splitter.manual_chunks(id, ctx)
    }

    /// Visit every module in `ctx`, entries first, and return the modules
    /// that were split out with their chunk group.
    pub fn plan_chunks(&mut self, ctx: &dyn ModuleGraphContext) -> IndexMap<String, String> {
        let ids = ctx.module_ids();
        let (entries, rest): (Vec<&str>, Vec<&str>) = ids
            .into_iter()
            .partition(|id| ctx.module_info(id).is_some_and(|info| info.is_entry));

        let mut planned = IndexMap::new();
        for id in entries.into_iter().chain(rest) {
            if let Some(chunk) = self.splitter.manual_chunks(id, ctx) {
                planned.insert(id.to_string(), chunk);
            }
        }

        tracing::debug!(
            format = %self.format,
            dts = self.dts,
            modules = planned.len(),
            "planned chunk groups"
        );
        planned
    }

    pub fn splitter(&self) -> &ChunkSplitter {
        &self.splitter
    }
}
