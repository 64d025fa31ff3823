//! Package manifest model.
//!
//! Only the fields that drive entry derivation are modelled. `exports` and
//! `bin` are kept as raw JSON and converted on demand into [`ExportsNode`],
//! which turns the string-or-nested-object union into a tagged tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::conditions::PackageType;
use crate::runtime::Runtime;
use crate::{Error, Result};

/// Maximum allowed size for package.json files (10MB)
const MAX_PACKAGE_JSON_SIZE: u64 = 10 * 1024 * 1024;

/// Parsed package.json structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    /// Raw `type` field (`"module"` | `"commonjs"`)
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    pub exports: Option<Value>,
    pub main: Option<String>,
    pub module: Option<String>,
    pub types: Option<String>,
    pub typings: Option<String>,
    pub bin: Option<Value>,
    /// Read by output planning for external lists, never by entry resolution
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: IndexMap<String, String>,
    /// File path this was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackageJson {
    /// Load package.json from a specific path using the provided runtime.
    ///
    /// Rejects files over 10MB and non-UTF-8 content.
    pub async fn from_path(runtime: &dyn Runtime, path: &Path) -> Result<Self> {
        let metadata = runtime.metadata(path).await.map_err(|e| {
            Error::InvalidManifest(format!("Cannot read package.json metadata: {e}"))
        })?;

        if metadata.size > MAX_PACKAGE_JSON_SIZE {
            return Err(Error::InvalidManifest(format!(
                "package.json exceeds maximum size of {}MB",
                MAX_PACKAGE_JSON_SIZE / 1024 / 1024
            )));
        }

        let content_bytes = runtime
            .read_file(path)
            .await
            .map_err(|e| Error::InvalidManifest(format!("Failed to read package.json: {e}")))?;

        let content = String::from_utf8(content_bytes).map_err(|e| {
            Error::InvalidManifest(format!("package.json contains invalid UTF-8: {e}"))
        })?;

        let mut pkg = Self::from_json_str(&content)?;
        pkg.path = path.to_path_buf();
        Ok(pkg)
    }

    /// Parse a manifest from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::InvalidManifest(format!("Invalid package.json format: {e}")))
    }

    pub fn package_type(&self) -> PackageType {
        PackageType::from_field(self.package_type.as_deref())
    }

    /// `types`, falling back to the legacy `typings` spelling.
    pub fn types_field(&self) -> Option<&str> {
        self.types.as_deref().or(self.typings.as_deref())
    }
}

/// Tagged form of an `exports`-style field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportsNode {
    /// An output path string.
    Leaf(String),
    /// Subpath or condition keys mapped to further nodes, in manifest order.
    Node(IndexMap<String, ExportsNode>),
}

impl ExportsNode {
    /// Convert raw JSON into a tree.
    ///
    /// Returns `None` when the value is neither a string nor an object.
    /// Inside nested objects, `null` marks an excluded subpath and other
    /// unsupported values are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ExportsNode::Leaf(s.clone())),
            Value::Object(map) => {
                let mut children = IndexMap::with_capacity(map.len());
                for (key, child) in map {
                    match ExportsNode::from_value(child) {
                        Some(node) => {
                            children.insert(key.clone(), node);
                        }
                        None => {
                            tracing::debug!(key = %key, "skipping non-string, non-object export value");
                        }
                    }
                }
                Some(ExportsNode::Node(children))
            }
            _ => None,
        }
    }

    /// Replace every `*` in every leaf with `replacement`.
    pub fn substitute(&self, replacement: &str) -> ExportsNode {
        match self {
            ExportsNode::Leaf(path) => ExportsNode::Leaf(path.replace('*', replacement)),
            ExportsNode::Node(map) => ExportsNode::Node(
                map.iter()
                    .map(|(key, child)| (key.clone(), child.substitute(replacement)))
                    .collect(),
            ),
        }
    }
}

/// Short description of a JSON value's kind, for schema warnings.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_relevant_fields() {
        let pkg = PackageJson::from_json_str(
            r#"{
                "name": "pkg",
                "type": "module",
                "typings": "./dist/index.d.ts",
                "exports": { ".": "./dist/index.js" },
                "scripts": { "build": "pakt" }
            }"#,
        )
        .unwrap();

        assert_eq!(pkg.name.as_deref(), Some("pkg"));
        assert!(pkg.package_type().is_esm());
        assert_eq!(pkg.types_field(), Some("./dist/index.d.ts"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = PackageJson::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));
    }

    #[test]
    fn builds_tagged_tree_and_skips_nulls() {
        let value = json!({
            ".": { "import": "./a.mjs", "require": "./a.cjs" },
            "./internal/*": null
        });
        let node = ExportsNode::from_value(&value).unwrap();
        let ExportsNode::Node(map) = node else {
            panic!("expected object node");
        };
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("."));
    }

    #[test]
    fn rejects_non_object_roots() {
        assert!(ExportsNode::from_value(&json!(["./a.js"])).is_none());
        assert!(ExportsNode::from_value(&json!(42)).is_none());
        assert_eq!(json_kind(&json!(true)), "boolean");
    }

    #[test]
    fn substitutes_wildcards_in_leaves() {
        let node = ExportsNode::from_value(&json!({
            "import": "./dist/*/index.mjs",
            "types": "./dist/*.d.ts"
        }))
        .unwrap();
        let expected = ExportsNode::from_value(&json!({
            "import": "./dist/foo/index.mjs",
            "types": "./dist/foo.d.ts"
        }))
        .unwrap();
        assert_eq!(node.substitute("foo"), expected);
    }
}
