use codegraph_core::{CallSite, ImportSpecifier, Language, NodeLabel};
use codegraph_graph::{resolve_calls, resolve_imports, Graph};
use codegraph_parser::SymbolTable;
use std::collections::HashSet;

/// Two files: `a.ts` imports `bar` from `./b` and calls it. Exercises C5
/// (import resolution) feeding directly into C6 (call resolution) the way
/// the coordinator chains them between phase barriers.
#[test]
fn import_resolution_feeds_call_resolution() {
    let mut known_files = HashSet::new();
    known_files.insert("a.ts".to_string());
    known_files.insert("b.ts".to_string());

    let files = vec![(
        "a.ts".to_string(),
        Language::TypeScript,
        vec![ImportSpecifier {
            raw: "import { bar } from './b';".to_string(),
            is_relative: true,
        }],
    )];
    let import_map = resolve_imports(&files, &known_files);
    assert!(import_map.get("a.ts").unwrap().contains("b.ts"));

    let mut table = SymbolTable::new();
    let bar_id = codegraph_core::NodeId::for_definition(NodeLabel::Function, "b.ts", "bar");
    table.insert("b.ts", "bar", bar_id.clone(), NodeLabel::Function);

    let caller_id = codegraph_core::NodeId::for_definition(NodeLabel::Function, "a.ts", "main");
    let call_sites = vec![CallSite {
        caller_file: "a.ts".to_string(),
        caller_symbol: Some(caller_id.clone()),
        called_name: "bar".to_string(),
    }];

    let edges = resolve_calls(&call_sites, &table, &import_map);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].reason, "import-resolved");
    assert_eq!(edges[0].to, bar_id);

    let mut graph = Graph::new();
    for edge in edges {
        graph.add_edge(edge);
    }
    assert_eq!(graph.edges().len(), 1);
}
