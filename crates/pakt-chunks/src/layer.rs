//! Module layers.
//!
//! A layer names the execution boundary a module belongs to. It comes from
//! the module's first directive (`"use client"` → `client`) or from a
//! `name.<layer>-runtime.<ext>` file name.

use pakt_exports::conditions::is_source_extension;
use serde::{Deserialize, Serialize};

/// Per-module metadata attached by the compiler pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMeta {
    /// Directive prologue, in source order.
    #[serde(default)]
    pub directives: Vec<String>,
}

impl ModuleMeta {
    pub fn with_directives<I, S>(directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModuleMeta {
            directives: directives.into_iter().map(Into::into).collect(),
        }
    }
}

/// The module's own layer: its first directive other than `use strict`,
/// without the `use ` prefix.
pub fn module_layer(meta: &ModuleMeta) -> Option<String> {
    meta.directives
        .iter()
        .map(String::as_str)
        .filter(|directive| *directive != "use strict")
        .map(|directive| directive.strip_prefix("use ").unwrap_or(directive).trim())
        .find(|layer| !layer.is_empty())
        .map(str::to_string)
}

/// Layer declared through a `name.<layer>-runtime.<ext>` file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomLayer {
    pub name: String,
    pub layer: String,
}

impl CustomLayer {
    /// Chunk group for the file: `<name>-<layer>`.
    pub fn chunk_name(&self) -> String {
        format!("{}-{}", self.name, self.layer)
    }
}

pub fn custom_layer_from_file(id: &str) -> Option<CustomLayer> {
    let basename = id.rsplit(['/', '\\']).next().unwrap_or(id);
    let segments: Vec<&str> = basename.split('.').collect();
    if segments.len() < 3 {
        return None;
    }

    let ext = segments[segments.len() - 1];
    let layer = segments[segments.len() - 2].strip_suffix("-runtime")?;
    let is_word = |s: &str| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !is_source_extension(ext) || layer.is_empty() || !is_word(layer) || segments[0].is_empty() {
        return None;
    }

    Some(CustomLayer {
        name: segments[0].to_string(),
        layer: layer.to_string(),
    })
}

/// Short filesystem-safe token for a layer (or joined layer set).
///
/// Rolling `(h << 5) - h + c` over UTF-16 code units, read as unsigned
/// 32-bit, base-36 encoded and cut to three characters.
///
/// ```
/// use pakt_chunks::layer_hash;
///
/// assert_eq!(layer_hash("client"), "1ck");
/// assert_eq!(layer_hash("server"), "1k1");
/// ```
pub fn layer_hash(input: &str) -> String {
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    });
    let mut encoded = to_base36(hash as u32);
    encoded.truncate(3);
    encoded
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_non_strict_directive_is_the_layer() {
        let meta = ModuleMeta::with_directives(["use strict", "use client", "use server"]);
        assert_eq!(module_layer(&meta).as_deref(), Some("client"));
    }

    #[test]
    fn no_directives_means_no_layer() {
        assert_eq!(module_layer(&ModuleMeta::default()), None);
        assert_eq!(module_layer(&ModuleMeta::with_directives(["use strict"])), None);
    }

    #[test]
    fn custom_directives_keep_their_name() {
        let meta = ModuleMeta::with_directives(["use worker"]);
        assert_eq!(module_layer(&meta).as_deref(), Some("worker"));
        let meta = ModuleMeta::with_directives(["server-only"]);
        assert_eq!(module_layer(&meta).as_deref(), Some("server-only"));
    }

    #[test]
    fn runtime_file_names_declare_layers() {
        let custom = custom_layer_from_file("/app/src/app.browser-runtime.ts").unwrap();
        assert_eq!(custom.name, "app");
        assert_eq!(custom.layer, "browser");
        assert_eq!(custom.chunk_name(), "app-browser");

        assert_eq!(custom_layer_from_file("/app/src/app-runtime.ts"), None);
        assert_eq!(custom_layer_from_file("/app/src/app.browser-runtime.css"), None);
        assert_eq!(custom_layer_from_file("/app/src/app.-runtime.ts"), None);
        assert_eq!(custom_layer_from_file("C:\\src\\x.edge-runtime.js").unwrap().layer, "edge");
    }

    #[test]
    fn hashes_match_known_values() {
        assert_eq!(layer_hash("client-server"), "1ko");
        assert_eq!(layer_hash("a"), "2p");
        assert_eq!(layer_hash(""), "0");
    }

    proptest! {
        #[test]
        fn prop_hash_is_short_and_filename_safe(input in ".{0,40}") {
            let hash = layer_hash(&input);
            prop_assert!(!hash.is_empty() && hash.len() <= 3);
            prop_assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }
}
