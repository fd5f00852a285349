use crate::import_resolver::ImportMap;
use codegraph_core::{Edge, EdgeKind, HeritageKind, HeritageRef, NodeId, ResolutionReason};
use codegraph_parser::SymbolTable;

/// Implements C7: resolves `extends`/`implements` references to the
/// definition they name, using the same same-file / import-resolved /
/// fuzzy-global ladder as call resolution (§4.7), minus the builtin
/// block-list — a class extending a name that happens to collide with a
/// built-in identifier is not meaningfully ambiguous the way a call is.
pub fn resolve_heritage(refs: &[HeritageRef], subject_file: &dyn Fn(&NodeId) -> Option<String>, symbol_table: &SymbolTable, import_map: &ImportMap) -> Vec<Edge> {
    let mut edges = Vec::new();
    for heritage in refs {
        let Some(file_path) = subject_file(&heritage.subject) else {
            continue;
        };
        if let Some(edge) = resolve_one(&file_path, heritage, symbol_table, import_map) {
            edges.push(edge);
        }
    }
    edges
}

fn resolve_one(subject_file: &str, heritage: &HeritageRef, symbol_table: &SymbolTable, import_map: &ImportMap) -> Option<Edge> {
    let kind = match heritage.kind {
        HeritageKind::Extends => EdgeKind::Extends,
        HeritageKind::Implements => EdgeKind::Implements,
    };

    if let Some(target) = symbol_table.lookup_exact(subject_file, &heritage.referenced_name) {
        return Some(make_edge(heritage.subject.clone(), target.clone(), kind, ResolutionReason::SameFile));
    }

    let candidates = symbol_table.lookup_fuzzy(&heritage.referenced_name);
    if candidates.is_empty() {
        return None;
    }

    if let Some(imports) = import_map.get(subject_file) {
        if let Some(def) = candidates.iter().find(|d| imports.contains(&d.file_path)) {
            return Some(make_edge(heritage.subject.clone(), def.node_id.clone(), kind, ResolutionReason::ImportResolved));
        }
    }

    let reason = if candidates.len() == 1 {
        ResolutionReason::FuzzyGlobalUnique
    } else {
        ResolutionReason::FuzzyGlobalAmbiguous
    };
    Some(make_edge(heritage.subject.clone(), candidates[0].node_id.clone(), kind, reason))
}

fn make_edge(subject: NodeId, target: NodeId, kind: EdgeKind, reason: ResolutionReason) -> Edge {
    Edge::new(subject, target, kind, reason.confidence(), reason.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::NodeLabel;

    fn file_of(subject_file: &str) -> impl Fn(&NodeId) -> Option<String> {
        let f = subject_file.to_string();
        move |_| Some(f.clone())
    }

    #[test]
    fn same_file_extends_resolves() {
        let mut table = SymbolTable::new();
        let base = NodeId::for_definition(NodeLabel::Class, "a.ts", "Base");
        table.insert("a.ts", "Base", base.clone(), NodeLabel::Class);

        let subject = NodeId::for_definition(NodeLabel::Class, "a.ts", "Child");
        let refs = vec![HeritageRef {
            subject: subject.clone(),
            referenced_name: "Base".to_string(),
            kind: HeritageKind::Extends,
        }];

        let edges = resolve_heritage(&refs, &file_of("a.ts"), &table, &ImportMap::new());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::Extends);
        assert_eq!(edges[0].to, base);
        assert_eq!(edges[0].from, subject);
    }

    #[test]
    fn unresolvable_heritage_reference_is_dropped() {
        let table = SymbolTable::new();
        let subject = NodeId::for_definition(NodeLabel::Class, "a.ts", "Child");
        let refs = vec![HeritageRef {
            subject,
            referenced_name: "Nowhere".to_string(),
            kind: HeritageKind::Implements,
        }];
        let edges = resolve_heritage(&refs, &file_of("a.ts"), &table, &ImportMap::new());
        assert!(edges.is_empty());
    }
}
