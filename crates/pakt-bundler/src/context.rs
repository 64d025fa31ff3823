//! Build context: one package, one configuration, one runtime.
//!
//! [`BuildContext::prepare`] runs the entry pipeline
//! (manifest → wildcard resolution → condition parsing → entry collection)
//! and [`BuildContext::plan`] adds output planning and fresh build passes.
//! Nothing here is cached across calls; a rebuild calls `plan` again.

use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pakt_config::PaktConfig;
use pakt_exports::{
    CollectedEntries, Entries, ExportsNode, PackageJson, ParsedExportsInfo, Runtime,
    collect_entries, parse_exports, parse_exports_tree, resolve_wildcard_exports,
};

use crate::output::{OutputFile, externals_for, plan_outputs};
use crate::pass::BuildPass;
use crate::warnings::Warnings;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct BuildContext {
    base: PathBuf,
    config: PaktConfig,
    runtime: Arc<dyn Runtime>,
}

/// Entry table and everything derived alongside it.
#[derive(Debug, Clone)]
pub struct PreparedBuild {
    pub manifest: PackageJson,
    pub parsed: ParsedExportsInfo,
    pub entries: Entries,
    /// Binary export path → source file.
    pub bins: IndexMap<String, PathBuf>,
    pub warnings: Warnings,
}

/// Input for the host's build-config assembler.
#[derive(Debug)]
pub struct BuildPlan {
    pub prepared: PreparedBuild,
    pub outputs: Vec<OutputFile>,
    pub passes: Vec<BuildPass>,
    /// Entry key → module specifiers to keep external.
    pub externals: IndexMap<String, Vec<String>>,
}

impl BuildContext {
    /// `base` is the directory the configuration was loaded from.
    pub fn new(base: impl Into<PathBuf>, config: PaktConfig, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            base: base.into(),
            config,
            runtime,
        }
    }

    pub fn config(&self) -> &PaktConfig {
        &self.config
    }

    pub fn root(&self) -> PathBuf {
        self.config.root(&self.base)
    }

    pub fn source_root(&self) -> PathBuf {
        self.config.source_root(&self.base)
    }

    /// Derive the entry table. Warnings are collected, not reported.
    pub async fn prepare(&self) -> Result<PreparedBuild> {
        let root = self.root();
        let source_root = self.source_root();
        let runtime = self.runtime.as_ref();

        let manifest = PackageJson::from_path(runtime, &root.join("package.json")).await?;
        tracing::debug!(
            package = manifest.name.as_deref().unwrap_or("<unnamed>"),
            root = %root.display(),
            "preparing build"
        );

        let mut warnings = Warnings::new();
        let parsed = match manifest.exports.as_ref().and_then(ExportsNode::from_value) {
            Some(tree) => {
                let (resolved, expansion_warnings) =
                    resolve_wildcard_exports(runtime, &source_root, &tree).await;
                warnings.extend(expansion_warnings);
                parse_exports_tree(&manifest, Some(&resolved))
            }
            None => parse_exports(&manifest),
        };
        warnings.extend(parsed.warnings);

        let CollectedEntries {
            entries,
            bins,
            warnings: collect_warnings,
        } = collect_entries(runtime, &source_root, &parsed.info).await?;
        warnings.extend(collect_warnings);

        if entries.is_empty() {
            return Err(Error::NoEntries {
                source_dir: source_root,
            });
        }

        tracing::info!(
            entries = entries.len(),
            bins = bins.len(),
            "resolved entries"
        );

        Ok(PreparedBuild {
            manifest,
            parsed: parsed.info,
            entries,
            bins,
            warnings,
        })
    }

    /// Prepare, then plan outputs, externals and build passes.
    ///
    /// Accumulated warnings are reported once, at the end.
    pub async fn plan(&self) -> Result<BuildPlan> {
        let prepared = self.prepare().await?;
        let passes = BuildPass::for_config(&self.config)?;
        let outputs = plan_outputs(&prepared.manifest, &prepared.entries, &self.config);

        let externals = prepared
            .entries
            .keys()
            .map(|key| {
                let list = externals_for(
                    &prepared.manifest,
                    &prepared.entries,
                    key,
                    &self.config.external,
                );
                (key.clone(), list)
            })
            .collect();

        prepared.warnings.report();
        Ok(BuildPlan {
            prepared,
            outputs,
            passes,
            externals,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanSummary<'a> {
    entries: &'a Entries,
    outputs: &'a [OutputFile],
    externals: &'a IndexMap<String, Vec<String>>,
}

impl BuildPlan {
    /// JSON view of entries, outputs and externals for hosts that
    /// assemble the bundler config out of process.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(PlanSummary {
            entries: &self.prepared.entries,
            outputs: &self.outputs,
            externals: &self.externals,
        })
    }

    /// Absolute path of every planned output under `root`.
    pub fn output_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.outputs.iter().map(|output| output.path(root)).collect()
    }
}
