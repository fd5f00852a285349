use codegraph_core::{CommunityAttrs, Edge, EdgeKind, Node, NodeId, NodeLabel};
use std::collections::{HashMap, HashSet};

/// Implements C8a (§4.8): deterministic label propagation over the
/// symbol-level `CALLS` projection. Leiden-style modularity maximization is
/// the spec's suggestion but not its contract — any algorithm that produces
/// stable, well-formed communities satisfies it, and label propagation is
/// the simplest one that is exactly reproducible across runs without a
/// tie-breaking RNG.
///
/// Communities below the configured floor are still returned; callers that
/// build user-facing aggregates are responsible for filtering on
/// `symbol_count` (§4.8 "retained in store but filtered from user-facing
/// aggregates").
pub fn detect_communities(symbols: &[&Node], edges: &[Edge]) -> (Vec<Node>, Vec<Edge>) {
    let ids: Vec<NodeId> = {
        let mut v: Vec<NodeId> = symbols.iter().map(|n| n.id.clone()).collect();
        v.sort();
        v
    };
    if ids.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let adjacency = build_adjacency(&ids, edges);
    let labels = propagate_labels(&ids, &adjacency);

    let mut groups: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for id in &ids {
        groups.entry(labels[id].clone()).or_default().push(id.clone());
    }

    let symbols_by_id: HashMap<&NodeId, &Node> = symbols.iter().map(|n| (&n.id, *n)).collect();

    let mut community_nodes = Vec::new();
    let mut membership_edges = Vec::new();
    let mut sorted_group_keys: Vec<&NodeId> = groups.keys().collect();
    sorted_group_keys.sort();

    for key in sorted_group_keys {
        let mut members = groups[key].clone();
        members.sort();

        let cohesion = cohesion_of(&members, &adjacency);
        let keywords = keywords_of(&members, &symbols_by_id);
        let label = if keywords.is_empty() {
            "community".to_string()
        } else {
            keywords.join(" ")
        };

        let community_id = NodeId::for_derived(NodeLabel::Community, members.iter());
        community_nodes.push(Node::community(
            community_id.clone(),
            CommunityAttrs {
                label,
                keywords,
                cohesion,
                symbol_count: members.len(),
            },
        ));
        for member in &members {
            membership_edges.push(Edge::member_of(member.clone(), community_id.clone()));
        }
    }

    (community_nodes, membership_edges)
}

fn build_adjacency(ids: &[NodeId], edges: &[Edge]) -> HashMap<NodeId, Vec<NodeId>> {
    let known: HashSet<&NodeId> = ids.iter().collect();
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = ids.iter().map(|id| (id.clone(), Vec::new())).collect();
    for edge in edges {
        if edge.kind != EdgeKind::Calls {
            continue;
        }
        if known.contains(&edge.from) && known.contains(&edge.to) && edge.from != edge.to {
            adjacency.get_mut(&edge.from).unwrap().push(edge.to.clone());
            adjacency.get_mut(&edge.to).unwrap().push(edge.from.clone());
        }
    }
    for neighbors in adjacency.values_mut() {
        neighbors.sort();
        neighbors.dedup();
    }
    adjacency
}

/// Synchronous label propagation, iterating nodes in a fixed sorted order
/// and breaking frequency ties by the lexicographically smallest label, so
/// the same input graph always converges to the same partition.
fn propagate_labels(ids: &[NodeId], adjacency: &HashMap<NodeId, Vec<NodeId>>) -> HashMap<NodeId, NodeId> {
    let mut labels: HashMap<NodeId, NodeId> = ids.iter().map(|id| (id.clone(), id.clone())).collect();
    const MAX_ITERATIONS: usize = 20;

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for id in ids {
            let neighbors = &adjacency[id];
            if neighbors.is_empty() {
                continue;
            }
            let mut counts: HashMap<&NodeId, usize> = HashMap::new();
            for n in neighbors {
                *counts.entry(&labels[n]).or_insert(0) += 1;
            }
            let best = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(label, _)| label.clone());
            if let Some(best) = best {
                if labels[id] != best {
                    labels.insert(id.clone(), best);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    labels
}

fn cohesion_of(members: &[NodeId], adjacency: &HashMap<NodeId, Vec<NodeId>>) -> f32 {
    let member_set: HashSet<&NodeId> = members.iter().collect();
    let mut internal = 0usize;
    let mut total = 0usize;
    for member in members {
        for neighbor in &adjacency[member] {
            total += 1;
            if member_set.contains(neighbor) {
                internal += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        internal as f32 / total as f32
    }
}

/// Token-frequency heuristic label: splits member names on case and
/// underscore boundaries, ranks tokens by frequency (ties broken
/// alphabetically), keeps the top two.
fn keywords_of(members: &[NodeId], symbols_by_id: &HashMap<&NodeId, &Node>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for member in members {
        if let Some(node) = symbols_by_id.get(member) {
            for token in tokens_of(node) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(2).map(|(token, _)| token).collect()
}

fn tokens_of(node: &Node) -> Vec<String> {
    let (name, file_path) = match &node.payload {
        codegraph_core::NodePayload::Symbol(attrs) => (attrs.name.as_str(), attrs.file_path.as_str()),
        _ => return Vec::new(),
    };
    let mut tokens = split_identifier(name);
    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if let Some(folder) = parent.file_name().and_then(|s| s.to_str()) {
            tokens.extend(split_identifier(folder));
        }
    }
    tokens.into_iter().map(|t| t.to_lowercase()).filter(|t| t.len() > 2).collect()
}

fn split_identifier(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in raw.chars() {
        if c == '_' || c == '-' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev_lower = c.is_lowercase();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::{Confidence, Span, SymbolAttrs};

    fn symbol(file: &str, name: &str) -> Node {
        Node::symbol(
            NodeLabel::Function,
            file,
            name,
            SymbolAttrs {
                name: name.to_string(),
                file_path: file.to_string(),
                span: Span::new(1, 1),
                is_exported: None,
                content: String::new(),
            },
        )
    }

    #[test]
    fn connected_symbols_land_in_the_same_community() {
        let a = symbol("a.ts", "handleLogin");
        let b = symbol("b.ts", "validateLogin");
        let c = symbol("c.ts", "unrelatedStandalone");
        let edge = Edge::new(a.id.clone(), b.id.clone(), EdgeKind::Calls, Confidence::new(0.9), "import-resolved");

        let (communities, membership) = detect_communities(&[&a, &b, &c], &[edge]);
        assert_eq!(communities.len(), 2, "a+b share a community, c stands alone");
        assert_eq!(membership.len(), 3);
    }

    #[test]
    fn isolated_symbols_each_form_a_singleton_community() {
        let a = symbol("a.ts", "foo");
        let b = symbol("b.ts", "bar");
        let (communities, _) = detect_communities(&[&a, &b], &[]);
        assert_eq!(communities.len(), 2);
    }
}
