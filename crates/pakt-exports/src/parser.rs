//! Condition parser: flattens the manifest's export-like fields into
//! `canonical export path → [(output, condition chains)]`.

use indexmap::IndexMap;
use path_clean::PathClean;
use serde::Serialize;
use std::path::PathBuf;

use crate::conditions::{ConditionChain, DEFAULT_VARIANT, PackageType, export_type_from_file};
use crate::export_path::{BINARY_TAG, normalize_export_path, special_condition_of};
use crate::manifest::{ExportsNode, PackageJson, json_kind};
use crate::warning::Warning;

/// One output file reachable from an export path.
///
/// `chains[0]` is the chain that first produced the file; later chains that
/// resolve to the same file are appended rather than creating a new target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTarget {
    pub output: String,
    pub chains: Vec<ConditionChain>,
}

impl ExportTarget {
    pub fn primary(&self) -> &ConditionChain {
        &self.chains[0]
    }
}

/// Canonical export path → output targets, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedExportsInfo {
    paths: IndexMap<String, Vec<ExportTarget>>,
}

impl ParsedExportsInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, export_path: &str) -> Option<&[ExportTarget]> {
        self.paths.get(export_path).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ExportTarget])> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn export_paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Flattened `(output, chain)` pairs for one export path.
    pub fn pairs<'a>(
        &'a self,
        export_path: &str,
    ) -> impl Iterator<Item = (&'a str, &'a ConditionChain)> + 'a {
        self.paths
            .get(export_path)
            .into_iter()
            .flatten()
            .flat_map(|target| {
                target
                    .chains
                    .iter()
                    .map(move |chain| (target.output.as_str(), chain))
            })
    }

    /// Record `output` under `export_path`, merging with an existing target
    /// that resolves to the same file.
    pub fn insert(&mut self, export_path: &str, output: &str, chain: ConditionChain) {
        let canonical = normalize_export_path(export_path);
        let targets = self.paths.entry(canonical).or_default();
        let resolved = resolved_output(output);

        match targets
            .iter_mut()
            .find(|t| resolved_output(&t.output) == resolved)
        {
            Some(existing) => {
                if !existing.chains.contains(&chain) {
                    existing.chains.push(chain);
                }
            }
            None => targets.push(ExportTarget {
                output: output.to_string(),
                chains: vec![chain],
            }),
        }
    }

    /// Like [`insert`](Self::insert), but skipped entirely when the file is
    /// already produced by some target of `export_path`.
    fn insert_fallback(&mut self, export_path: &str, output: &str, chain: ConditionChain) {
        let canonical = normalize_export_path(export_path);
        let resolved = resolved_output(output);
        let already_defined = self
            .paths
            .get(&canonical)
            .is_some_and(|targets| targets.iter().any(|t| resolved_output(&t.output) == resolved));

        if already_defined {
            tracing::debug!(export_path = %canonical, output, "top-level field already covered by exports");
            return;
        }
        self.insert(&canonical, output, chain);
    }
}

fn resolved_output(output: &str) -> PathBuf {
    PathBuf::from(output).clean()
}

/// Result of parsing a manifest: the export table plus schema warnings.
#[derive(Debug, Clone, Default)]
pub struct ParsedExports {
    pub info: ParsedExportsInfo,
    pub warnings: Vec<Warning>,
}

/// Parse `exports`, `bin`, `main`, `module` and `types` into one table.
///
/// Wildcard keys are skipped here; resolve them first with
/// [`resolve_wildcard_exports`](crate::resolve_wildcard_exports).
pub fn parse_exports(pkg: &PackageJson) -> ParsedExports {
    let mut warnings = Vec::new();
    let tree = pkg.exports.as_ref().and_then(|value| {
        let tree = ExportsNode::from_value(value);
        if tree.is_none() {
            warnings.push(Warning::InvalidExportsField {
                field: "exports".to_string(),
                found: json_kind(value).to_string(),
            });
        }
        tree
    });
    parse_with_tree(pkg, tree.as_ref(), warnings)
}

/// Parse using an already-converted (and possibly wildcard-resolved) tree
/// in place of the manifest's raw `exports` value.
pub fn parse_exports_tree(pkg: &PackageJson, exports: Option<&ExportsNode>) -> ParsedExports {
    parse_with_tree(pkg, exports, Vec::new())
}

fn parse_with_tree(
    pkg: &PackageJson,
    exports: Option<&ExportsNode>,
    warnings: Vec<Warning>,
) -> ParsedExports {
    let mut parser = Parser {
        package_type: pkg.package_type(),
        info: ParsedExportsInfo::new(),
        warnings,
    };

    if let Some(tree) = exports {
        parser.walk(tree, ".", &ConditionChain::new());
    }
    parser.parse_bin(pkg);
    parser.fold_top_level_fields(pkg);

    ParsedExports {
        info: parser.info,
        warnings: parser.warnings,
    }
}

struct Parser {
    package_type: PackageType,
    info: ParsedExportsInfo,
    warnings: Vec<Warning>,
}

impl Parser {
    fn walk(&mut self, node: &ExportsNode, export_path: &str, chain: &ConditionChain) {
        match node {
            ExportsNode::Leaf(output) => {
                let mut chain = chain.clone();
                if !chain.is_types() && chain.runtime().is_none() {
                    chain.push(export_type_from_file(output, self.package_type));
                }
                self.info.insert(export_path, output, chain);
            }
            ExportsNode::Node(children) => {
                for (key, child) in children {
                    if key.contains('*') {
                        tracing::debug!(pattern = %key, "unresolved wildcard export key skipped");
                        continue;
                    }

                    if key.starts_with('.') {
                        // Path segment: conditions reset for this branch, except
                        // a special suffix in the key itself (`./index.development`)
                        let mut seed = ConditionChain::new();
                        if let Some(special) = special_condition_of(key) {
                            seed.push(special);
                        }
                        self.walk(child, key, &seed);
                        continue;
                    }

                    let mut next = chain.clone();
                    if !next.push(key) && key != DEFAULT_VARIANT && !chain.contains(key) {
                        self.warnings.push(Warning::IgnoredCondition {
                            export_path: normalize_export_path(export_path),
                            condition: key.clone(),
                            chain: chain.to_string(),
                        });
                    }
                    self.walk(child, export_path, &next);
                }
            }
        }
    }

    fn parse_bin(&mut self, pkg: &PackageJson) {
        let Some(bin) = pkg.bin.as_ref() else {
            return;
        };

        match ExportsNode::from_value(bin) {
            Some(ExportsNode::Leaf(output)) => {
                let chain = ConditionChain::new().with(export_type_from_file(&output, self.package_type));
                self.info.insert(BINARY_TAG, &output, chain);
            }
            Some(ExportsNode::Node(bins)) => {
                for (name, target) in bins {
                    let ExportsNode::Leaf(output) = target else {
                        tracing::debug!(bin = %name, "nested bin entries are not supported");
                        continue;
                    };
                    let chain =
                        ConditionChain::new().with(export_type_from_file(&output, self.package_type));
                    self.info
                        .insert(&format!("{}/{}", BINARY_TAG, name), &output, chain);
                }
            }
            None => self.warnings.push(Warning::InvalidExportsField {
                field: "bin".to_string(),
                found: json_kind(bin).to_string(),
            }),
        }
    }

    fn fold_top_level_fields(&mut self, pkg: &PackageJson) {
        if let Some(main) = pkg.main.as_deref() {
            let chain = ConditionChain::new().with(export_type_from_file(main, self.package_type));
            self.info.insert_fallback(".", main, chain);
        }
        if let Some(module) = pkg.module.as_deref() {
            self.info
                .insert_fallback(".", module, ConditionChain::new().with("module"));
        }
        if let Some(types) = pkg.types_field() {
            self.info
                .insert_fallback(".", types, ConditionChain::new().with("types"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: serde_json::Value) -> PackageJson {
        serde_json::from_value(value).unwrap()
    }

    fn chains(info: &ParsedExportsInfo, path: &str) -> Vec<(String, String)> {
        info.pairs(path)
            .map(|(output, chain)| (output.to_string(), chain.to_string()))
            .collect()
    }

    #[test]
    fn string_exports_is_a_single_root_leaf() {
        let parsed = parse_exports(&manifest(json!({ "exports": "./dist/index.js" })));
        assert_eq!(
            chains(&parsed.info, "."),
            vec![("./dist/index.js".to_string(), "require".to_string())]
        );
    }

    #[test]
    fn esm_package_infers_import() {
        let parsed = parse_exports(&manifest(json!({
            "type": "module",
            "exports": { "./utils": "./dist/utils.js" }
        })));
        assert_eq!(
            chains(&parsed.info, "./utils"),
            vec![("./dist/utils.js".to_string(), "import".to_string())]
        );
    }

    #[test]
    fn nested_conditions_accumulate_and_reset_per_path() {
        let parsed = parse_exports(&manifest(json!({
            "exports": {
                ".": {
                    "import": {
                        "types": "./dist/index.d.mts",
                        "development": "./dist/index.development.mjs",
                        "default": "./dist/index.mjs"
                    },
                    "require": "./dist/index.cjs"
                },
                "./client": {
                    "react-server": "./dist/client.react-server.js",
                    "default": "./dist/client.js"
                }
            }
        })));

        assert_eq!(
            chains(&parsed.info, "."),
            vec![
                ("./dist/index.d.mts".to_string(), "import.types".to_string()),
                (
                    "./dist/index.development.mjs".to_string(),
                    "import.development".to_string()
                ),
                ("./dist/index.mjs".to_string(), "import".to_string()),
                ("./dist/index.cjs".to_string(), "require".to_string()),
            ]
        );
        assert_eq!(
            chains(&parsed.info, "./client"),
            vec![
                (
                    "./dist/client.react-server.js".to_string(),
                    "react-server.require".to_string()
                ),
                ("./dist/client.js".to_string(), "default".to_string()),
            ]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn index_paths_are_canonicalized() {
        let parsed = parse_exports(&manifest(json!({
            "exports": { "./index": "./dist/index.js", "./foo/index": "./dist/foo.js" }
        })));
        let paths: Vec<_> = parsed.info.export_paths().collect();
        assert_eq!(paths, vec![".", "./foo"]);
    }

    #[test]
    fn same_file_under_two_chains_collapses_to_one_target() {
        let parsed = parse_exports(&manifest(json!({
            "exports": {
                ".": { "import": "./dist/index.js", "default": "dist/index.js" }
            }
        })));
        let targets = parsed.info.get(".").unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].output, "./dist/index.js");
        assert_eq!(targets[0].primary().to_string(), "import");
        assert_eq!(targets[0].chains.len(), 2);
    }

    #[test]
    fn top_level_fields_fold_into_root_unless_already_exported() {
        let parsed = parse_exports(&manifest(json!({
            "main": "./dist/index.cjs",
            "module": "./dist/index.mjs",
            "types": "./dist/index.d.ts",
            "exports": { ".": { "import": "./dist/index.mjs" } }
        })));

        assert_eq!(
            chains(&parsed.info, "."),
            vec![
                ("./dist/index.mjs".to_string(), "import".to_string()),
                ("./dist/index.cjs".to_string(), "require".to_string()),
                ("./dist/index.d.ts".to_string(), "types".to_string()),
            ]
        );
    }

    #[test]
    fn bin_entries_live_in_their_own_namespace() {
        let single = parse_exports(&manifest(json!({ "bin": "./dist/cli.js" })));
        assert_eq!(
            chains(&single.info, "$binary"),
            vec![("./dist/cli.js".to_string(), "require".to_string())]
        );

        let named = parse_exports(&manifest(json!({
            "type": "module",
            "bin": { "tool": "./dist/bin/tool.cjs", "other": "./dist/bin/other.js" }
        })));
        assert_eq!(
            chains(&named.info, "$binary/tool"),
            vec![("./dist/bin/tool.cjs".to_string(), "require".to_string())]
        );
        assert_eq!(
            chains(&named.info, "$binary/other"),
            vec![("./dist/bin/other.js".to_string(), "import".to_string())]
        );
    }

    #[test]
    fn invalid_exports_field_warns_and_keeps_other_fields() {
        let parsed = parse_exports(&manifest(json!({
            "exports": ["./dist/index.js"],
            "main": "./dist/index.js"
        })));
        assert_eq!(
            parsed.warnings,
            vec![Warning::InvalidExportsField {
                field: "exports".to_string(),
                found: "array".to_string()
            }]
        );
        assert_eq!(parsed.info.len(), 1);
    }

    #[test]
    fn conflicting_nested_runtime_condition_is_reported() {
        let parsed = parse_exports(&manifest(json!({
            "exports": { "import": { "require": "./dist/x.js" } }
        })));
        assert_eq!(chains(&parsed.info, "."), vec![("./dist/x.js".to_string(), "import".to_string())]);
        assert!(matches!(
            parsed.warnings.as_slice(),
            [Warning::IgnoredCondition { condition, .. }] if condition == "require"
        ));
    }

    #[test]
    fn special_suffix_in_path_key_enters_the_chain() {
        let parsed = parse_exports(&manifest(json!({
            "exports": {
                ".": "./dist/index.js",
                "./index.development": "./dist/index.development.js",
                "./utils.react-server": { "import": "./dist/utils.rsc.mjs" }
            }
        })));

        assert_eq!(
            chains(&parsed.info, "."),
            vec![
                ("./dist/index.js".to_string(), "require".to_string()),
                (
                    "./dist/index.development.js".to_string(),
                    "development.require".to_string()
                ),
            ]
        );
        assert_eq!(
            chains(&parsed.info, "./utils"),
            vec![(
                "./dist/utils.rsc.mjs".to_string(),
                "react-server.import".to_string()
            )]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn wildcard_keys_are_left_for_expansion() {
        let parsed = parse_exports(&manifest(json!({
            "exports": { "./features/*": "./dist/features/*.js" }
        })));
        assert!(parsed.info.is_empty());
    }

    mod chain_properties {
        use super::*;
        use crate::conditions::{is_runtime_condition, is_special_condition};
        use proptest::prelude::*;
        use serde_json::Value;

        const CONDITION_KEYS: &[&str] = &[
            "import",
            "require",
            "module",
            "default",
            "types",
            "node",
            "browser",
            "development",
            "production",
            "react-server",
            "react-native",
            "edge-light",
        ];

        const PATH_KEYS: &[&str] = &[".", "./utils", "./index.development", "./client.react-server"];

        const OUTPUTS: &[&str] = &["./dist/a.js", "./dist/b.mjs", "./dist/c.cjs", "./dist/d.d.ts"];

        fn conditions() -> impl Strategy<Value = Value> {
            let leaf = prop::sample::select(OUTPUTS).prop_map(|output| Value::String(output.to_string()));
            leaf.prop_recursive(4, 48, 4, |inner| {
                prop::collection::vec((prop::sample::select(CONDITION_KEYS), inner), 1..4).prop_map(
                    |pairs| {
                        Value::Object(
                            pairs
                                .into_iter()
                                .map(|(key, value)| (key.to_string(), value))
                                .collect(),
                        )
                    },
                )
            })
        }

        fn exports() -> impl Strategy<Value = Value> {
            prop::collection::vec((prop::sample::select(PATH_KEYS), conditions()), 1..4).prop_map(
                |pairs| {
                    Value::Object(
                        pairs
                            .into_iter()
                            .map(|(key, value)| (key.to_string(), value))
                            .collect(),
                    )
                },
            )
        }

        proptest! {
            #[test]
            fn parsed_chains_hold_one_runtime_and_one_special_at_most(
                exports in exports(),
                module in any::<bool>(),
            ) {
                let package_type = if module { "module" } else { "commonjs" };
                let parsed = parse_exports(&manifest(json!({
                    "type": package_type,
                    "exports": exports,
                })));

                for path in parsed.info.export_paths() {
                    for (output, chain) in parsed.info.pairs(path) {
                        let conditions = chain.conditions();
                        let runtimes = conditions.iter().filter(|c| is_runtime_condition(c)).count();
                        let specials = conditions.iter().filter(|c| is_special_condition(c)).count();

                        prop_assert!(runtimes <= 1, "{} -> {}: {}", path, output, chain);
                        prop_assert!(specials <= 1, "{} -> {}: {}", path, output, chain);
                        prop_assert!(chain.is_types() || chain.runtime().is_some());
                    }
                }
            }
        }
    }
}
