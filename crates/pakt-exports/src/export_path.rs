//! Export path helpers.
//!
//! An export path is either dot-relative (`"."`, `"./foo"`) or lives in the
//! binary namespace (`"$binary"`, `"$binary/cli"`). The canonical form drops
//! special-condition suffixes and trailing `/index` segments so that
//! `./index.development`, `./index` and `.` all address the same source
//! identity.

use crate::conditions::is_special_condition;

/// Prefix for export paths derived from the manifest's `bin` field.
pub const BINARY_TAG: &str = "$binary";

pub fn is_binary_path(path: &str) -> bool {
    path == BINARY_TAG || path.starts_with("$binary/")
}

/// Prefix bare relative paths with `./` (`"foo"` → `"./foo"`).
pub fn relativify(path: &str) -> String {
    if path.is_empty() {
        ".".to_string()
    } else if path.starts_with('.') || is_binary_path(path) {
        path.to_string()
    } else {
        format!("./{}", path)
    }
}

/// Canonicalize an export path. Idempotent.
///
/// ```
/// use pakt_exports::normalize_export_path;
///
/// assert_eq!(normalize_export_path("./index"), ".");
/// assert_eq!(normalize_export_path("./index.development"), ".");
/// assert_eq!(normalize_export_path("./foo/index.react-server"), "./foo");
/// assert_eq!(normalize_export_path("$binary/index"), "$binary");
/// ```
pub fn normalize_export_path(path: &str) -> String {
    let mut current = relativify(path);

    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(path: &str) -> String {
    let mut path = path.trim_end_matches('/');
    if path.is_empty() {
        return ".".to_string();
    }

    if let Some((head, tail)) = path.rsplit_once('.') {
        if is_special_condition(tail) && !head.is_empty() && !head.ends_with('/') {
            path = head;
        }
    }

    if path == "./index" || path == "index" {
        return ".".to_string();
    }
    if let Some(head) = path.strip_suffix("/index") {
        path = head;
    }
    if path.is_empty() || path == "./" {
        return ".".to_string();
    }

    path.to_string()
}

/// The special condition encoded as a suffix of an export path, if any.
pub fn special_condition_of(path: &str) -> Option<&str> {
    let (_, tail) = path.rsplit_once('.')?;
    is_special_condition(tail).then_some(tail)
}

/// Key under which an entry is stored: the canonical path, plus the special
/// condition for variant sources (`./foo.development`, `./index.react-server`).
pub fn entry_key(canonical: &str, special: Option<&str>) -> String {
    match special {
        None => canonical.to_string(),
        Some(special) if canonical == "." => format!("./index.{}", special),
        Some(special) => format!("{}.{}", canonical, special),
    }
}

/// Source subpath (relative to the source root, no extension) addressed by
/// a canonical export path. Binary paths map into the `bin/` folder.
pub(crate) fn source_subpath(canonical: &str) -> String {
    if let Some(rest) = canonical.strip_prefix(BINARY_TAG) {
        return format!("bin{}", rest);
    }
    match canonical {
        "." => "index".to_string(),
        other => other.trim_start_matches("./").to_string(),
    }
}

/// Public specifier for an export path (`"."` → `name`, `"./utils"` → `name/utils`).
pub fn public_specifier(package_name: &str, canonical: &str) -> Option<String> {
    if is_binary_path(canonical) {
        return None;
    }
    match canonical {
        "." => Some(package_name.to_string()),
        other => Some(format!(
            "{}/{}",
            package_name,
            other.trim_start_matches("./")
        )),
    }
}
