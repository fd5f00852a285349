use codegraph_core::{Edge, EdgeKind, Node, NodeId};
use std::collections::{HashMap, HashSet};

/// The in-memory graph a single pipeline run builds before persistence
/// (§4.9). Nodes are keyed by id so re-indexing a file can delete and
/// re-create its subgraph (§3 "Lifecycle"); edges are de-duplicated by
/// `(from, to, kind)` at insert time rather than at persist time, which is
/// an equivalent, earlier point to enforce the same guarantee (§4.6).
#[derive(Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    edges: Vec<Edge>,
    edge_keys: HashSet<(String, String, EdgeKind)>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn upsert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        let key = edge.dedup_key();
        if self.edge_keys.insert(key) {
            self.edges.push(edge);
        }
    }

    /// Removes every node and edge belonging to `file_path`'s subgraph, so
    /// the caller can re-create it from a fresh parse (§3 "Lifecycle",
    /// §4.10 incremental re-seeding).
    pub fn remove_file_subgraph(&mut self, file_path: &str) {
        let stale: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.file_path() == Some(file_path))
            .map(|n| n.id.clone())
            .collect();
        let stale_set: HashSet<&NodeId> = stale.iter().collect();
        for id in &stale {
            self.nodes.remove(id);
        }
        self.edges.retain(|e| !stale_set.contains(&e.from) && !stale_set.contains(&e.to));
        self.edge_keys
            .retain(|(from, to, _)| !stale.iter().any(|id| id.as_str() == from || id.as_str() == to));
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Deterministic, sorted id lists used for the determinism property
    /// (§8 property 1): two runs over the same inputs must yield identical
    /// lists.
    pub fn canonical_node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().map(|id| id.as_str().to_string()).collect();
        ids.sort();
        ids
    }

    pub fn canonical_edge_keys(&self) -> Vec<(String, String, EdgeKind)> {
        let mut keys: Vec<(String, String, EdgeKind)> = self.edges.iter().map(|e| e.dedup_key()).collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::{Confidence, NodeLabel};

    #[test]
    fn duplicate_edges_are_deduplicated_on_insert() {
        let mut graph = Graph::new();
        let a = NodeId::for_definition(NodeLabel::Function, "a.ts", "foo");
        let b = NodeId::for_definition(NodeLabel::Function, "b.ts", "bar");
        graph.add_edge(Edge::new(a.clone(), b.clone(), EdgeKind::Calls, Confidence::new(0.9), "import-resolved"));
        graph.add_edge(Edge::new(a, b, EdgeKind::Calls, Confidence::new(0.9), "import-resolved"));
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn removing_a_file_drops_its_nodes_and_incident_edges() {
        let mut graph = Graph::new();
        graph.upsert_node(Node::file("a.ts", "content".into()));
        let sym = NodeId::for_definition(NodeLabel::Function, "a.ts", "foo");
        graph.add_edge(Edge::defines(NodeId::file("a.ts"), sym));

        graph.remove_file_subgraph("a.ts");
        assert_eq!(graph.node_count(), 0);
        assert!(graph.edges().is_empty());
    }
}
