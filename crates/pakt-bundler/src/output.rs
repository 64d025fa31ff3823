//! Output planning: what files each entry produces and what stays external.
//!
//! The result feeds the host's build-config assembler, which turns every
//! [`OutputFile`] into one bundler input/output pair.

use indexmap::{IndexMap, IndexSet};
use path_clean::PathClean;
use serde::Serialize;
use std::path::{Path, PathBuf};

use pakt_config::{Format, PaktConfig};
use pakt_exports::{
    ConditionChain, Entries, Entry, PackageJson, PackageType, export_type_from_file,
    public_specifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Asset,
    Declaration,
}

/// One file the build emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    /// Key of the entry in the entry table.
    pub entry_key: String,
    pub source: PathBuf,
    /// Output path as written in the manifest.
    pub output: String,
    pub format: Format,
    pub kind: OutputKind,
    /// Every condition chain that resolves to this file, dot-joined.
    pub conditions: Vec<String>,
}

impl OutputFile {
    /// Absolute, cleaned output path under `root`.
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(&self.output).clean()
    }
}

/// Plan every output for `entries`.
///
/// Assets whose format is not in `config.formats` are skipped. Declarations
/// are planned only when `config.dts` is set: from `types` chains when the
/// entry has any, otherwise derived from its asset outputs.
pub fn plan_outputs(manifest: &PackageJson, entries: &Entries, config: &PaktConfig) -> Vec<OutputFile> {
    let package_type = manifest.package_type();
    let mut planned: IndexMap<String, OutputFile> = IndexMap::new();

    for (key, entry) in entries {
        for (chain, output) in entry.asset_outputs() {
            let format = format_of(chain, output, package_type);
            if !config.formats.contains(&format) {
                tracing::debug!(entry = %key, output, %format, "format not enabled, skipping output");
                continue;
            }
            add_output(&mut planned, key, entry, chain, output, format, OutputKind::Asset);
        }

        if !config.dts {
            continue;
        }

        let mut declarations = entry.declaration_outputs().peekable();
        if declarations.peek().is_some() {
            for (chain, output) in declarations {
                let format = format_of(chain, output, package_type);
                add_output(&mut planned, key, entry, chain, output, format, OutputKind::Declaration);
            }
        } else {
            for (chain, output) in entry.asset_outputs() {
                let format = format_of(chain, output, package_type);
                if !config.formats.contains(&format) {
                    continue;
                }
                if let Some(dts) = dts_output_for(output) {
                    add_output(&mut planned, key, entry, chain, &dts, format, OutputKind::Declaration);
                }
            }
        }
    }

    planned.into_values().collect()
}

fn add_output(
    planned: &mut IndexMap<String, OutputFile>,
    key: &str,
    entry: &Entry,
    chain: &ConditionChain,
    output: &str,
    format: Format,
    kind: OutputKind,
) {
    let resolved = PathBuf::from(output).clean().to_string_lossy().into_owned();
    let condition = chain.to_string();

    let file = planned.entry(resolved).or_insert_with(|| OutputFile {
        entry_key: key.to_string(),
        source: entry.source.clone(),
        output: output.to_string(),
        format,
        kind,
        conditions: Vec::new(),
    });
    if !file.conditions.contains(&condition) {
        file.conditions.push(condition);
    }
}

/// Format of an output: the chain's runtime condition when it pins one,
/// otherwise inferred from the file extension and package type.
fn format_of(chain: &ConditionChain, output: &str, package_type: PackageType) -> Format {
    let condition = match chain.runtime() {
        Some(runtime @ ("import" | "module" | "require")) => runtime,
        _ => export_type_from_file(output, package_type),
    };
    match condition {
        "require" => Format::Cjs,
        _ => Format::Esm,
    }
}

/// Declaration file emitted next to a JavaScript output.
///
/// ```
/// use pakt_bundler::dts_output_for;
///
/// assert_eq!(dts_output_for("./dist/index.js").as_deref(), Some("./dist/index.d.ts"));
/// assert_eq!(dts_output_for("./dist/index.cjs").as_deref(), Some("./dist/index.d.cts"));
/// assert_eq!(dts_output_for("./dist/index.mjs").as_deref(), Some("./dist/index.d.mts"));
/// assert_eq!(dts_output_for("./dist/styles.css"), None);
/// ```
pub fn dts_output_for(output: &str) -> Option<String> {
    [(".mjs", ".d.mts"), (".cjs", ".d.cts"), (".js", ".d.ts")]
        .iter()
        .find_map(|(ext, dts)| {
            output
                .strip_suffix(ext)
                .map(|stem| format!("{}{}", stem, dts))
        })
}

/// Module specifiers the bundle of `entry_key` must not inline.
///
/// Dependencies and peer dependencies, `extra`, then the public specifier of
/// every other entry so that sibling entries import each other instead of
/// duplicating code.
pub fn externals_for(
    manifest: &PackageJson,
    entries: &Entries,
    entry_key: &str,
    extra: &[String],
) -> Vec<String> {
    let mut externals: IndexSet<String> = IndexSet::new();
    externals.extend(manifest.dependencies.keys().cloned());
    externals.extend(manifest.peer_dependencies.keys().cloned());
    externals.extend(extra.iter().cloned());

    let own = entries.get(entry_key).map(|entry| entry.name.as_str());
    if let Some(name) = manifest.name.as_deref() {
        for entry in entries.values() {
            if Some(entry.name.as_str()) == own || entry.is_binary() {
                continue;
            }
            if let Some(specifier) = public_specifier(name, &entry.name) {
                externals.insert(specifier);
            }
        }
    }

    externals.into_iter().collect()
}
