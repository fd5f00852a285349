use codegraph_core::{NodeId, NodeLabel};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Definition {
    pub file_path: String,
    pub node_id: NodeId,
    pub kind: NodeLabel,
}

/// Implements C3: per-file exact lookup plus a reverse fuzzy index over
/// every definition seen this run (§4.3).
#[derive(Default)]
pub struct SymbolTable {
    exact: HashMap<(String, String), NodeId>,
    fuzzy: HashMap<String, Vec<Definition>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn insert(&mut self, file_path: &str, name: &str, node_id: NodeId, kind: NodeLabel) {
        self.exact
            .insert((file_path.to_string(), name.to_string()), node_id.clone());
        self.fuzzy
            .entry(name.to_string())
            .or_default()
            .push(Definition {
                file_path: file_path.to_string(),
                node_id,
                kind,
            });
    }

    pub fn lookup_exact(&self, file_path: &str, name: &str) -> Option<&NodeId> {
        self.exact.get(&(file_path.to_string(), name.to_string()))
    }

    /// Returns every definition of `name`, in the stable order they were
    /// inserted — needed so the fuzzy-global tie-break (§4.6 strategy 3) is
    /// deterministic.
    pub fn lookup_fuzzy(&self, name: &str) -> &[Definition] {
        self.fuzzy.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.exact.clear();
        self.fuzzy.clear();
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_lookup_is_single_answer() {
        let mut table = SymbolTable::new();
        let id = NodeId::for_definition(NodeLabel::Function, "a.ts", "foo");
        table.insert("a.ts", "foo", id.clone(), NodeLabel::Function);
        assert_eq!(table.lookup_exact("a.ts", "foo"), Some(&id));
        assert_eq!(table.lookup_exact("b.ts", "foo"), None);
    }

    #[test]
    fn fuzzy_lookup_preserves_insertion_order() {
        let mut table = SymbolTable::new();
        let first = NodeId::for_definition(NodeLabel::Function, "a.ts", "log");
        let second = NodeId::for_definition(NodeLabel::Function, "b.ts", "log");
        table.insert("a.ts", "log", first.clone(), NodeLabel::Function);
        table.insert("b.ts", "log", second.clone(), NodeLabel::Function);

        let defs = table.lookup_fuzzy("log");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].node_id, first);
        assert_eq!(defs[1].node_id, second);
    }
}
