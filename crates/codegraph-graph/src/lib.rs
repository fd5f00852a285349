//! Cross-file resolution, derived-node detection, and persistence for the
//! ingestion engine (C5 through C10). Per-file parsing and extraction lives
//! in `codegraph-parser`; this crate picks up from a completed parse batch
//! and produces the graph that gets written to the store.

pub mod builtins;
pub mod call_tracer;
pub mod community;
pub mod heritage;
pub mod import_resolver;
pub mod incremental;
pub mod model;
pub mod persist;
pub mod process;
pub mod store;

pub use call_tracer::resolve_calls;
pub use heritage::resolve_heritage;
pub use import_resolver::{resolve_imports, ImportMap};
pub use incremental::{
    compute_changed_set, compute_deleted_set, decide, is_reseedable, load_metadata, load_snapshot,
    reseed_symbol_table, write_metadata, write_snapshot, GraphSnapshot, IncrementalDecision, RunMetadata, RunStats,
};
pub use model::Graph;
pub use persist::{persist_graph, PersistReport};
pub use store::{database_path, KuzuGraphStore};

use codegraph_core::{DetectionConfig, Edge, Node, NodeId};
use std::collections::HashMap;

/// Runs C8 end to end: communities first, since process detection records
/// which communities each trace passes through.
pub fn detect_communities_and_processes(symbols: &[&Node], edges: &[Edge], config: &DetectionConfig) -> (Vec<Node>, Vec<Edge>) {
    let (community_nodes, membership_edges) = community::detect_communities(symbols, edges);

    let mut symbol_to_community: HashMap<NodeId, NodeId> = HashMap::new();
    for edge in &membership_edges {
        symbol_to_community.insert(edge.from.clone(), edge.to.clone());
    }

    let (process_nodes, step_edges) = process::detect_processes(symbols, edges, &symbol_to_community, config);

    let mut nodes = community_nodes;
    nodes.extend(process_nodes);
    let mut out_edges = membership_edges;
    out_edges.extend(step_edges);
    (nodes, out_edges)
}
