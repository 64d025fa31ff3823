//! Splitting graphs built from real source text.

use pakt_chunks::{ChunkSplitter, ModuleGraph, ModuleGraphContext, ModuleMeta, layer_hash};

fn module(graph: &mut ModuleGraph, id: &str, source: &str) {
    graph.add_module(id, ModuleMeta::from_source(source, id));
}

/// A server entry rendering a client component, plus a client entry
/// re-exporting the same component.
fn app_graph() -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    graph.add_entry(
        "/app/src/index.ts",
        ModuleMeta::from_source("'use server';\nexport { Page } from './page';\n", "index.ts"),
    );
    graph.add_entry(
        "/app/src/client.ts",
        ModuleMeta::from_source("'use client';\nexport * from './button';\n", "client.ts"),
    );
    module(
        &mut graph,
        "/app/src/page.tsx",
        "import { Button } from './button';\nexport const Page = () => <Button />;\n",
    );
    module(
        &mut graph,
        "/app/src/button.tsx",
        "\"use client\";\nimport { cx } from './cx';\nexport const Button = () => <b className={cx()} />;\n",
    );
    module(&mut graph, "/app/src/cx.ts", "export const cx = () => 'btn';\n");
    module(
        &mut graph,
        "/app/src/action.ts",
        "'use server';\nimport { cx } from './cx';\nexport async function act() { return cx(); }\n",
    );

    graph.add_import("/app/src/index.ts", "/app/src/page.tsx");
    graph.add_import("/app/src/index.ts", "/app/src/action.ts");
    graph.add_import("/app/src/page.tsx", "/app/src/button.tsx");
    graph.add_import("/app/src/client.ts", "/app/src/button.tsx");
    graph.add_import("/app/src/button.tsx", "/app/src/cx.ts");
    graph.add_import("/app/src/action.ts", "/app/src/cx.ts");
    graph
}

fn plan(graph: &ModuleGraph) -> Vec<(String, Option<String>)> {
    let mut splitter = ChunkSplitter::default();
    graph
        .module_ids()
        .into_iter()
        .map(|id| (id.to_string(), splitter.manual_chunks(id, graph)))
        .collect()
}

#[test]
fn boundary_and_shared_chunks_are_assigned() {
    let graph = app_graph();
    let assigned = plan(&graph);
    let chunk_of = |id: &str| {
        assigned
            .iter()
            .find(|(module, _)| module == id)
            .and_then(|(_, chunk)| chunk.clone())
    };

    assert_eq!(chunk_of("/app/src/index.ts"), None);
    assert_eq!(chunk_of("/app/src/client.ts"), None);
    assert_eq!(chunk_of("/app/src/page.tsx"), None);
    assert_eq!(
        chunk_of("/app/src/button.tsx"),
        Some(format!("button-{}", layer_hash("client")))
    );
    assert_eq!(
        chunk_of("/app/src/cx.ts"),
        Some(format!("cx-{}", layer_hash("client-server")))
    );
    assert_eq!(chunk_of("/app/src/action.ts"), None);
}

#[test]
fn separate_passes_agree() {
    let graph = app_graph();
    assert_eq!(plan(&graph), plan(&graph));
}
