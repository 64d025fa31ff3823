//! Entry collection: marries the parsed export table with source files.
//!
//! Every canonical export path is probed for `{base}.{ext}` and
//! `{base}/index.{ext}` under the source root, plus one
//! `{base}.{special}.{ext}` variant per special condition its chains mention.
//! Probes for different export paths are independent and run concurrently;
//! conflict detection needs the full picture and runs after the join.

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::conditions::{ConditionChain, SOURCE_EXTENSIONS};
use crate::export_path::{
    BINARY_TAG, entry_key, is_binary_path, normalize_export_path, relativify,
    source_subpath, special_condition_of,
};
use crate::parser::ParsedExportsInfo;
use crate::runtime::Runtime;
use crate::warning::Warning;
use crate::{Error, Result};

/// A buildable entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Absolute path of the source file.
    pub source: PathBuf,
    /// Canonical export path this entry belongs to.
    pub name: String,
    /// Output file per condition chain.
    pub export: IndexMap<ConditionChain, String>,
}

impl Entry {
    pub fn is_binary(&self) -> bool {
        is_binary_path(&self.name)
    }

    /// `(chain, output)` pairs that produce runtime assets (non-`types`).
    pub fn asset_outputs(&self) -> impl Iterator<Item = (&ConditionChain, &str)> {
        self.export
            .iter()
            .filter(|(chain, _)| !chain.is_types())
            .map(|(chain, output)| (chain, output.as_str()))
    }

    /// `(chain, output)` pairs that produce declaration files.
    pub fn declaration_outputs(&self) -> impl Iterator<Item = (&ConditionChain, &str)> {
        self.export
            .iter()
            .filter(|(chain, _)| chain.is_types())
            .map(|(chain, output)| (chain, output.as_str()))
    }
}

/// Entry key (export path, possibly with a special suffix) → entry.
pub type Entries = IndexMap<String, Entry>;

/// Output of [`collect_entries`].
#[derive(Debug, Clone, Default)]
pub struct CollectedEntries {
    pub entries: Entries,
    /// Binary export path → absolute source file.
    pub bins: IndexMap<String, PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Source files found for one canonical export path.
#[derive(Debug, Default)]
struct ProbedSources {
    canonical: String,
    default: Option<PathBuf>,
    variants: IndexMap<String, PathBuf>,
    /// Every existing candidate, relative to the source root.
    files: Vec<String>,
}

/// Resolve every export path in `info` to source files under `source_root`.
///
/// Fails with [`Error::ConflictingEntries`] when two different source files
/// map to the same export identity. Export paths without a source are
/// dropped with a warning.
pub async fn collect_entries(
    runtime: &dyn Runtime,
    source_root: &Path,
    info: &ParsedExportsInfo,
) -> Result<CollectedEntries> {
    let probes = info.export_paths().map(|canonical| {
        let mut specials: Vec<String> = Vec::new();
        for (_, chain) in info.pairs(canonical) {
            if let Some(special) = chain.special() {
                if !specials.iter().any(|s| s == special) {
                    specials.push(special.to_string());
                }
            }
        }
        probe_export_path(runtime, source_root, canonical.to_string(), specials)
    });
    let probed = join_all(probes).await;

    check_conflicts(probed.iter().flat_map(|sources| {
        let binary = is_binary_path(&sources.canonical);
        sources.files.iter().map(move |file| Candidate::new(file, binary))
    }))?;

    let mut collected = CollectedEntries::default();
    for sources in &probed {
        collect_one(info, sources, &mut collected);
    }

    tracing::debug!(
        entries = collected.entries.len(),
        bins = collected.bins.len(),
        "collected entries"
    );
    Ok(collected)
}

fn collect_one(info: &ParsedExportsInfo, sources: &ProbedSources, collected: &mut CollectedEntries) {
    let canonical = sources.canonical.as_str();
    let mut missing_output: Option<&str> = None;

    for (output, chain) in info.pairs(canonical) {
        let variant = chain
            .special()
            .and_then(|special| sources.variants.get(special).map(|path| (path, special)));

        let (source, special) = match (variant, sources.default.as_ref()) {
            (Some((path, special)), _) => (path, Some(special)),
            (None, Some(path)) => (path, None),
            (None, None) => {
                missing_output.get_or_insert(output);
                continue;
            }
        };

        let key = entry_key(canonical, special);
        let entry = collected.entries.entry(key).or_insert_with(|| Entry {
            source: source.clone(),
            name: canonical.to_string(),
            export: IndexMap::new(),
        });
        match entry.export.entry(chain.clone()) {
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(output.to_string());
            }
            indexmap::map::Entry::Occupied(slot) if slot.get() != output => {
                collected.warnings.push(Warning::DuplicateCondition {
                    export_path: canonical.to_string(),
                    chain: chain.to_string(),
                    kept: slot.get().clone(),
                    ignored: output.to_string(),
                });
            }
            indexmap::map::Entry::Occupied(_) => {}
        }
    }

    if let Some(output) = missing_output {
        tracing::debug!(export_path = canonical, output, "no source file for export path");
        collected.warnings.push(if canonical == "." {
            Warning::MissingPrimaryEntry {
                output: output.to_string(),
            }
        } else {
            Warning::MissingSource {
                export_path: canonical.to_string(),
                output: output.to_string(),
            }
        });
    }

    if is_binary_path(canonical) {
        if let Some(source) = &sources.default {
            collected.bins.insert(canonical.to_string(), source.clone());
        }
    }
}

async fn probe_export_path(
    runtime: &dyn Runtime,
    source_root: &Path,
    canonical: String,
    specials: Vec<String>,
) -> ProbedSources {
    let subpath = source_subpath(&canonical);
    let mut probed = ProbedSources {
        canonical,
        ..ProbedSources::default()
    };

    for ext in SOURCE_EXTENSIONS {
        for relative in [format!("{subpath}.{ext}"), format!("{subpath}/index.{ext}")] {
            let path = source_root.join(&relative);
            if runtime.is_file(&path).await {
                probed.default.get_or_insert(path);
                probed.files.push(relative);
            }
        }
    }

    // bin sources have no environment variants
    if is_binary_path(&probed.canonical) {
        return probed;
    }

    for special in specials {
        for ext in SOURCE_EXTENSIONS {
            for relative in [
                format!("{subpath}.{special}.{ext}"),
                format!("{subpath}/index.{special}.{ext}"),
            ] {
                let path = source_root.join(&relative);
                if runtime.is_file(&path).await {
                    if !probed.variants.contains_key(&special) {
                        probed.variants.insert(special.clone(), path);
                    }
                    probed.files.push(relative);
                }
            }
        }
    }

    probed
}

/// Check that no two source files share an export identity.
///
/// `files` are paths relative to the source root. A file's identity is its
/// path without extension, special-condition suffix or trailing `index`
/// segment; variants with different special conditions do not collide.
///
/// ```
/// use pakt_exports::validate_entry_files;
///
/// assert!(validate_entry_files(&["index.js", "index/index.ts"]).is_err());
/// assert!(validate_entry_files(&["index.development.js", "index.ts"]).is_ok());
/// ```
pub fn validate_entry_files<S: AsRef<str>>(files: &[S]) -> Result<()> {
    check_conflicts(files.iter().map(|file| Candidate::new(file.as_ref(), false)))
}

struct Candidate {
    file: String,
    identity: String,
    special: Option<String>,
}

impl Candidate {
    fn new(file: &str, binary: bool) -> Self {
        let file = file.replace('\\', "/");
        let stem = strip_extension(&file);
        let special = special_condition_of(stem).map(str::to_string);
        let identity = normalize_export_path(&relativify(stem));

        // `bin/cli.ts` is reported under the `bin` namespace it was declared in
        let identity = match identity.strip_prefix("./bin") {
            Some(rest) if binary && (rest.is_empty() || rest.starts_with('/')) => {
                format!("{}{}", BINARY_TAG, rest)
            }
            _ => identity,
        };

        Candidate {
            file,
            identity,
            special,
        }
    }
}

fn strip_extension(file: &str) -> &str {
    let name_start = file.rfind('/').map_or(0, |i| i + 1);
    match file[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &file[..name_start + dot],
        _ => file,
    }
}

fn check_conflicts(candidates: impl IntoIterator<Item = Candidate>) -> Result<()> {
    let mut seen: IndexMap<(String, Option<String>), String> = IndexMap::new();
    let mut conflicted: Vec<String> = Vec::new();

    for candidate in candidates {
        let key = (candidate.identity, candidate.special);
        match seen.get(&key) {
            Some(existing) if *existing != candidate.file => {
                tracing::debug!(
                    identity = %key.0,
                    first = %existing,
                    second = %candidate.file,
                    "conflicting entry files"
                );
                if !conflicted.contains(&key.0) {
                    conflicted.push(key.0);
                }
            }
            Some(_) => {}
            None => {
                seen.insert(key, candidate.file);
            }
        }
    }

    if conflicted.is_empty() {
        Ok(())
    } else {
        Err(Error::ConflictingEntries { paths: conflicted })
    }
}
