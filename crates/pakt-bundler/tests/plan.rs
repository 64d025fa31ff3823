//! Build planning over fixture packages.

use pakt_bundler::{BuildContext, Error, Format, OutputKind, PaktConfig};
use pakt_chunks::{ModuleGraph, ModuleMeta, layer_hash};
use pakt_exports::Warning;
use pakt_exports::runtime::test_utils::{TestRuntime, write_tree};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn context(dir: &TempDir, config: PaktConfig) -> BuildContext {
    let runtime = Arc::new(TestRuntime::new(dir.path().to_path_buf()));
    BuildContext::new(dir.path(), config, runtime)
}

const LIBRARY_MANIFEST: &str = r#"{
  "name": "pkg",
  "type": "module",
  "exports": {
    ".": {
      "types": "./dist/index.d.ts",
      "import": "./dist/index.mjs",
      "require": "./dist/index.cjs"
    },
    "./utils": "./dist/utils.js",
    "./features/*": "./dist/features/*.mjs"
  },
  "bin": "./dist/cli.js",
  "dependencies": { "react": "^19.0.0" }
}"#;

fn library(dir: &TempDir) {
    write_tree(
        dir.path(),
        &[
            ("package.json", LIBRARY_MANIFEST),
            ("src/index.ts", "export * from './utils';\n"),
            ("src/utils.ts", "export const id = (x) => x;\n"),
            ("src/features/search.ts", "export const search = 1;\n"),
            ("src/features/_internal.ts", "export const hidden = 1;\n"),
            ("src/bin/index.ts", "#!/usr/bin/env node\n"),
        ],
    );
}

#[tokio::test]
async fn prepares_entries_from_manifest_and_sources() {
    let dir = TempDir::new().unwrap();
    library(&dir);

    let prepared = context(&dir, PaktConfig::default_config())
        .prepare()
        .await
        .unwrap();

    let keys: Vec<&str> = prepared.entries.keys().map(String::as_str).collect();
    assert_eq!(keys, vec![".", "./utils", "./features/search", "$binary"]);
    assert_eq!(
        prepared.bins.get("$binary"),
        Some(&dir.path().join("src/bin/index.ts"))
    );
    assert_eq!(prepared.manifest.name.as_deref(), Some("pkg"));
    assert!(prepared.warnings.is_empty());
}

#[tokio::test]
async fn plans_outputs_externals_and_passes() {
    let dir = TempDir::new().unwrap();
    library(&dir);

    let config = PaktConfig {
        dts: true,
        external: vec!["lodash".to_string()],
        ..PaktConfig::default_config()
    };
    let plan = context(&dir, config).plan().await.unwrap();

    let find = |output: &str| plan.outputs.iter().find(|o| o.output == output);

    let cjs = find("./dist/index.cjs").unwrap();
    assert_eq!(cjs.format, Format::Cjs);
    assert_eq!(cjs.kind, OutputKind::Asset);
    assert_eq!(cjs.source, dir.path().join("src/index.ts"));

    let types = find("./dist/index.d.ts").unwrap();
    assert_eq!(types.kind, OutputKind::Declaration);
    assert_eq!(types.conditions, vec!["types"]);

    assert_eq!(find("./dist/features/search.mjs").unwrap().format, Format::Esm);
    assert_eq!(
        find("./dist/utils.d.ts").unwrap().kind,
        OutputKind::Declaration
    );
    assert!(find("./dist/features/_internal.mjs").is_none());

    assert_eq!(
        plan.externals.get(".").unwrap(),
        &vec!["react", "lodash", "pkg/utils", "pkg/features/search"]
    );
    assert_eq!(
        plan.externals.get("$binary").unwrap(),
        &vec!["react", "lodash", "pkg", "pkg/utils", "pkg/features/search"]
    );

    let passes: Vec<(Format, bool)> = plan.passes.iter().map(|p| (p.format, p.dts)).collect();
    assert_eq!(
        passes,
        vec![
            (Format::Esm, false),
            (Format::Cjs, false),
            (Format::Esm, true),
            (Format::Cjs, true),
        ]
    );

    assert_eq!(
        plan.output_paths(dir.path())[0],
        dir.path().join("dist/index.mjs")
    );
}

#[tokio::test]
async fn missing_sources_are_warnings() {
    let dir = TempDir::new().unwrap();
    write_tree(
        dir.path(),
        &[
            (
                "package.json",
                r#"{ "exports": { ".": "./dist/index.js", "./gone": "./dist/gone.js" } }"#,
            ),
            ("src/index.ts", ""),
        ],
    );

    let prepared = context(&dir, PaktConfig::default_config())
        .prepare()
        .await
        .unwrap();
    assert_eq!(prepared.entries.len(), 1);
    assert!(prepared.warnings.iter().any(|w| matches!(
        w,
        Warning::MissingSource { export_path, .. } if export_path == "./gone"
    )));
}

#[tokio::test]
async fn package_without_entries_fails() {
    let dir = TempDir::new().unwrap();
    write_tree(dir.path(), &[("package.json", r#"{ "name": "empty" }"#)]);

    let err = context(&dir, PaktConfig::default_config())
        .plan()
        .await
        .unwrap_err();
    match err {
        Error::NoEntries { source_dir } => assert_eq!(source_dir, dir.path().join("src")),
        other => panic!("expected NoEntries, got {other:?}"),
    }
}

#[tokio::test]
async fn conflicting_sources_abort_the_build() {
    let dir = TempDir::new().unwrap();
    write_tree(
        dir.path(),
        &[
            ("package.json", r#"{ "main": "./dist/index.js" }"#),
            ("src/index.ts", ""),
            ("src/index.js", ""),
        ],
    );

    let err = context(&dir, PaktConfig::default_config())
        .prepare()
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Conflicted entry files found for entries: ."
    );
}

#[tokio::test]
async fn missing_manifest_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = context(&dir, PaktConfig::default_config())
        .prepare()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Exports(pakt_exports::Error::InvalidManifest(_))
    ));
}

#[tokio::test]
async fn nested_package_root_and_source_dir() {
    let dir = TempDir::new().unwrap();
    write_tree(
        dir.path(),
        &[
            (
                "packages/core/package.json",
                r#"{ "name": "core", "exports": "./dist/index.mjs" }"#,
            ),
            ("packages/core/lib/index.ts", ""),
        ],
    );

    let config = PaktConfig {
        cwd: Some(PathBuf::from("packages/core")),
        source_dir: PathBuf::from("lib"),
        formats: vec![Format::Esm],
        ..PaktConfig::default_config()
    };
    let plan = context(&dir, config).plan().await.unwrap();

    assert_eq!(plan.outputs.len(), 1);
    assert_eq!(
        plan.outputs[0].source,
        dir.path().join("packages/core/lib/index.ts")
    );

    let json = plan.to_json().unwrap();
    assert_eq!(json["outputs"][0]["entryKey"], ".");
    assert_eq!(json["outputs"][0]["format"], "esm");
    assert_eq!(json["entries"]["."]["export"]["import"], "./dist/index.mjs");
}

#[tokio::test]
async fn passes_split_modules_across_layers() {
    let dir = TempDir::new().unwrap();
    write_tree(
        dir.path(),
        &[
            (
                "package.json",
                r#"{ "name": "app", "exports": { ".": "./dist/index.mjs", "./client": "./dist/client.mjs" } }"#,
            ),
            ("src/index.ts", "'use server';\nexport * from './theme';\n"),
            ("src/client.ts", "'use client';\nexport * from './theme';\n"),
            ("src/theme.ts", "export const theme = 'dark';\n"),
        ],
    );

    let mut plan = context(&dir, PaktConfig::default_config())
        .plan()
        .await
        .unwrap();

    // Stand in for the engine: build the module graph from the entry sources.
    let mut graph = ModuleGraph::new();
    let theme = dir.path().join("src/theme.ts").to_string_lossy().into_owned();
    graph.add_module(
        theme.clone(),
        ModuleMeta::from_source(&std::fs::read_to_string(&theme).unwrap(), &theme),
    );
    for entry in plan.prepared.entries.values() {
        let id = entry.source.to_string_lossy().into_owned();
        let source = std::fs::read_to_string(&entry.source).unwrap();
        graph.add_entry(id.clone(), ModuleMeta::from_source(&source, &id));
        graph.add_import(&id, &theme);
    }

    let expected = format!("theme-{}", layer_hash("client-server"));
    for pass in &mut plan.passes {
        let chunks = pass.plan_chunks(&graph);
        assert_eq!(chunks.get(&theme), Some(&expected));
        assert_eq!(chunks.len(), 1);
    }
}
