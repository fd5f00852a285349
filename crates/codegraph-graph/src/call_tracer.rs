use crate::builtins::is_builtin;
use crate::import_resolver::ImportMap;
use codegraph_core::{CallSite, Edge, EdgeKind, NodeId, ResolutionReason};
use codegraph_parser::SymbolTable;

/// Implements C6: resolves every call site's callee via the three-strategy
/// ladder (§4.6), stopping at the first hit. The caller id is already
/// resolved by the extractor (the nearest enclosing function/method, or
/// `None` for a module-top-level call).
pub fn resolve_calls(call_sites: &[CallSite], symbol_table: &SymbolTable, import_map: &ImportMap) -> Vec<Edge> {
    let mut edges = Vec::new();

    for site in call_sites {
        if is_builtin(&site.called_name) {
            continue;
        }

        let is_module_top_level = site.caller_symbol.is_none();
        let caller_id = site
            .caller_symbol
            .clone()
            .unwrap_or_else(|| NodeId::file(&site.caller_file));

        if let Some(edge) = resolve_one(&caller_id, is_module_top_level, site, symbol_table, import_map) {
            edges.push(edge);
        }
    }

    edges
}

fn resolve_one(
    caller_id: &NodeId,
    is_module_top_level: bool,
    site: &CallSite,
    symbol_table: &SymbolTable,
    import_map: &ImportMap,
) -> Option<Edge> {
    // §3 invariant 3: a CALLS edge sourced from a File (no enclosing
    // function) always carries reason `module-top-level`, regardless of
    // which strategy below locates the callee.
    let reason_override = is_module_top_level.then_some(ResolutionReason::ModuleTopLevel);

    // Strategy 1: same-file.
    if let Some(callee) = symbol_table.lookup_exact(&site.caller_file, &site.called_name) {
        let reason = reason_override.unwrap_or(ResolutionReason::SameFile);
        return Some(make_edge(caller_id.clone(), callee.clone(), reason));
    }

    let candidates = symbol_table.lookup_fuzzy(&site.called_name);
    if candidates.is_empty() {
        return None;
    }

    // Strategy 2: import-resolved.
    if let Some(imports) = import_map.get(&site.caller_file) {
        if let Some(def) = candidates.iter().find(|d| imports.contains(&d.file_path)) {
            let reason = reason_override.unwrap_or(ResolutionReason::ImportResolved);
            return Some(make_edge(caller_id.clone(), def.node_id.clone(), reason));
        }
    }

    // Strategy 3: fuzzy-global.
    let reason = reason_override.unwrap_or(if candidates.len() == 1 {
        ResolutionReason::FuzzyGlobalUnique
    } else {
        ResolutionReason::FuzzyGlobalAmbiguous
    });
    Some(make_edge(caller_id.clone(), candidates[0].node_id.clone(), reason))
}

fn make_edge(caller: NodeId, callee: NodeId, reason: ResolutionReason) -> Edge {
    Edge::new(caller, callee, EdgeKind::Calls, reason.confidence(), reason.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::NodeLabel;

    fn site(caller_file: &str, caller_symbol: Option<NodeId>, called_name: &str) -> CallSite {
        CallSite {
            caller_file: caller_file.to_string(),
            caller_symbol,
            called_name: called_name.to_string(),
        }
    }

    #[test]
    fn same_file_takes_priority() {
        let mut table = SymbolTable::new();
        let local = NodeId::for_definition(NodeLabel::Function, "a.ts", "bar");
        table.insert("a.ts", "bar", local.clone(), NodeLabel::Function);
        let caller = NodeId::for_definition(NodeLabel::Function, "a.ts", "foo");
        let edges = resolve_calls(&[site("a.ts", Some(caller), "bar")], &table, &ImportMap::new());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].reason, "same-file");
        assert_eq!(edges[0].to, local);
    }

    #[test]
    fn import_resolved_beats_fuzzy_global() {
        let mut table = SymbolTable::new();
        let in_b = NodeId::for_definition(NodeLabel::Function, "b.ts", "log");
        let in_c = NodeId::for_definition(NodeLabel::Function, "c.ts", "log");
        table.insert("b.ts", "log", in_b.clone(), NodeLabel::Function);
        table.insert("c.ts", "log", in_c, NodeLabel::Function);

        let mut imports = ImportMap::new();
        imports.insert("a.ts".to_string(), ["b.ts".to_string()].into_iter().collect());

        let caller = NodeId::for_definition(NodeLabel::Function, "a.ts", "foo");
        let edges = resolve_calls(&[site("a.ts", Some(caller), "log")], &table, &imports);
        assert_eq!(edges[0].reason, "import-resolved");
        assert_eq!(edges[0].to, in_b);
    }

    #[test]
    fn ambiguous_fuzzy_global_picks_first_listed() {
        let mut table = SymbolTable::new();
        let first = NodeId::for_definition(NodeLabel::Function, "a.ts", "log");
        let second = NodeId::for_definition(NodeLabel::Function, "b.ts", "log");
        table.insert("a.ts", "log", first.clone(), NodeLabel::Function);
        table.insert("b.ts", "log", second, NodeLabel::Function);

        let caller = NodeId::for_definition(NodeLabel::Function, "c.ts", "caller");
        let edges = resolve_calls(&[site("c.ts", Some(caller), "log")], &table, &ImportMap::new());
        assert_eq!(edges[0].reason, "fuzzy-global");
        assert!((edges[0].confidence.value() - 0.3).abs() < f32::EPSILON);
        assert_eq!(edges[0].to, first);
    }

    #[test]
    fn module_top_level_call_uses_file_node_as_caller() {
        let mut table = SymbolTable::new();
        let target = NodeId::for_definition(NodeLabel::Function, "a.ts", "bar");
        table.insert("a.ts", "bar", target, NodeLabel::Function);
        let edges = resolve_calls(&[site("a.ts", None, "bar")], &table, &ImportMap::new());
        assert_eq!(edges[0].from, NodeId::file("a.ts"));
        assert_eq!(edges[0].reason, "module-top-level");
    }
}
