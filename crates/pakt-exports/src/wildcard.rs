//! Wildcard export expansion.
//!
//! `"./features/*"` is matched against the source tree: every
//! `src/features/<name>.<ext>` and `src/features/<name>/index.<ext>` yields
//! the concrete export `"./features/<name>"`.

use indexmap::IndexMap;
use std::path::Path;

use crate::conditions::{SOURCE_EXTENSIONS, is_source_extension, is_special_condition};
use crate::manifest::ExportsNode;
use crate::runtime::{Runtime, RuntimeResult};
use crate::warning::Warning;

/// Expand one wildcard export key into `concrete export path → subpath`.
///
/// Directory listings are sorted, so the result is deterministic for a
/// fixed file-system snapshot. A missing base directory yields an empty map.
pub async fn expand_wildcard(
    runtime: &dyn Runtime,
    source_root: &Path,
    pattern: &str,
) -> RuntimeResult<IndexMap<String, String>> {
    let mut expanded = IndexMap::new();
    let Some((base, _)) = pattern.split_once('*') else {
        return Ok(expanded);
    };

    let base_dir = source_root.join(base.trim_start_matches("./").trim_start_matches('.'));
    if !runtime.exists(&base_dir) {
        tracing::debug!(pattern, dir = %base_dir.display(), "wildcard base directory does not exist");
        return Ok(expanded);
    }

    let mut names = runtime.read_dir(&base_dir).await?;
    names.sort();

    for name in names {
        if is_private_or_test_name(&name) {
            continue;
        }

        let path = base_dir.join(&name);
        let subpath = if runtime.is_dir(&path).await {
            if has_index_file(runtime, &path).await {
                Some(name)
            } else {
                None
            }
        } else {
            subpath_from_file_name(&name)
        };

        if let Some(subpath) = subpath {
            let concrete = pattern.replace('*', &subpath);
            if !expanded.contains_key(&concrete) {
                expanded.insert(concrete, subpath);
            }
        }
    }

    Ok(expanded)
}

/// Rewrite an `exports` tree, replacing each top-level wildcard key with its
/// concrete expansions.
///
/// Explicitly declared keys win over expansions that produce the same key.
/// Expansion failures are returned as warnings; the pattern contributes
/// nothing and the remaining keys are unaffected.
pub async fn resolve_wildcard_exports(
    runtime: &dyn Runtime,
    source_root: &Path,
    exports: &ExportsNode,
) -> (ExportsNode, Vec<Warning>) {
    let ExportsNode::Node(children) = exports else {
        return (exports.clone(), Vec::new());
    };
    if !children.keys().any(|key| key.contains('*')) {
        return (exports.clone(), Vec::new());
    }

    let mut warnings = Vec::new();
    let mut resolved: IndexMap<String, ExportsNode> = IndexMap::with_capacity(children.len());

    for (key, value) in children {
        if !key.contains('*') {
            resolved.insert(key.clone(), value.clone());
            continue;
        }

        match expand_wildcard(runtime, source_root, key).await {
            Ok(matches) => {
                tracing::debug!(pattern = %key, matches = matches.len(), "expanded wildcard export");
                for (concrete, subpath) in matches {
                    if children.contains_key(&concrete) {
                        continue;
                    }
                    resolved
                        .entry(concrete)
                        .or_insert_with(|| value.substitute(&subpath));
                }
            }
            Err(err) => warnings.push(Warning::WildcardExpansion {
                pattern: key.clone(),
                reason: err.to_string(),
            }),
        }
    }

    (ExportsNode::Node(resolved), warnings)
}

/// `_private`, `__tests__`, `__mocks__` and `*.test.*` / `*.spec.*` names.
pub(crate) fn is_private_or_test_name(name: &str) -> bool {
    if name.starts_with('_') {
        return true;
    }
    name.split('.')
        .skip(1)
        .any(|segment| segment == "test" || segment == "spec")
}

/// Subpath for a file directly under the wildcard base, or `None` if the
/// file is not an entry candidate.
fn subpath_from_file_name(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if !is_source_extension(ext) || stem.ends_with(".d") {
        return None;
    }

    // `foo.development.ts` is a variant of `foo`, not its own export
    let stem = match stem.rsplit_once('.') {
        Some((base, suffix)) if is_special_condition(suffix) => base,
        _ => stem,
    };

    if stem.is_empty() || stem == "index" {
        return None;
    }
    Some(stem.to_string())
}

async fn has_index_file(runtime: &dyn Runtime, dir: &Path) -> bool {
    for ext in SOURCE_EXTENSIONS {
        if runtime.is_file(&dir.join(format!("index.{}", ext))).await {
            return true;
        }
    }
    false
}
