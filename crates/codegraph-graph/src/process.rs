use codegraph_core::{DetectionConfig, Edge, EdgeKind, Node, NodeId, NodeLabel, ProcessAttrs};
use std::collections::{HashMap, HashSet, VecDeque};

/// Implements C8b (§4.8): picks entry-point symbols, traces each forward
/// along `CALLS` edges breadth-first, and emits a `Process` node per trace
/// that clears the minimum step count.
pub fn detect_processes(
    symbols: &[&Node],
    edges: &[Edge],
    symbol_to_community: &HashMap<NodeId, NodeId>,
    config: &DetectionConfig,
) -> (Vec<Node>, Vec<Edge>) {
    let out_adjacency = build_out_adjacency(edges);
    let in_degree = build_in_degree(edges);

    let mut candidates: Vec<(NodeId, f32)> = symbols
        .iter()
        .filter(|n| !is_excluded_path(n.file_path().unwrap_or("")))
        .filter_map(|n| {
            let name = symbol_name(n)?;
            if !matches_entry_pattern(&name) {
                return None;
            }
            let out_degree = out_adjacency.get(&n.id).map(|v| v.len()).unwrap_or(0);
            if out_degree == 0 {
                return None;
            }
            let callers = *in_degree.get(&n.id).unwrap_or(&0);
            let ratio = out_degree as f32 / callers.max(1) as f32;
            Some((n.id.clone(), ratio))
        })
        .collect();

    // Highest ratio first; ties broken by node id for determinism.
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));

    let cap = ((symbols.len() as f32 / 10.0).round() as usize).clamp(config.process_cap_min, config.process_cap_max);

    let mut process_nodes = Vec::new();
    let mut step_edges = Vec::new();

    for (entry, _) in candidates.into_iter().take(cap) {
        let trace = trace_forward(&entry, &out_adjacency, config.process_max_depth);
        if trace.len() < config.process_min_steps {
            continue;
        }

        let mut community_ids: Vec<NodeId> = trace
            .iter()
            .filter_map(|id| symbol_to_community.get(id).cloned())
            .collect();
        community_ids.sort();
        community_ids.dedup();

        let terminal_id = trace.last().cloned().unwrap_or_else(|| entry.clone());
        let process_id = NodeId::for_derived(NodeLabel::Process, trace.iter());
        process_nodes.push(Node::process(
            process_id.clone(),
            ProcessAttrs {
                label: entry_label(&entry),
                process_type: "call-trace".to_string(),
                step_count: trace.len(),
                community_ids,
                entry_point_id: entry.clone(),
                terminal_id,
            },
        ));

        for (step, symbol_id) in trace.iter().enumerate() {
            step_edges.push(Edge::step_in_process(symbol_id.clone(), process_id.clone(), step as u32));
        }
    }

    (process_nodes, step_edges)
}

fn build_out_adjacency(edges: &[Edge]) -> HashMap<NodeId, Vec<NodeId>> {
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for edge in edges {
        if edge.kind == EdgeKind::Calls {
            adjacency.entry(edge.from.clone()).or_default().push(edge.to.clone());
        }
    }
    for neighbors in adjacency.values_mut() {
        neighbors.sort();
        neighbors.dedup();
    }
    adjacency
}

fn build_in_degree(edges: &[Edge]) -> HashMap<NodeId, usize> {
    let mut counts: HashMap<NodeId, usize> = HashMap::new();
    for edge in edges {
        if edge.kind == EdgeKind::Calls {
            *counts.entry(edge.to.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Forward BFS from `entry`, ordinal 0 at the entry itself. Loop detection
/// is a visited set scoped to this single trace.
fn trace_forward(entry: &NodeId, out_adjacency: &HashMap<NodeId, Vec<NodeId>>, max_depth: usize) -> Vec<NodeId> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut order = Vec::new();
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();

    visited.insert(entry.clone());
    queue.push_back((entry.clone(), 0));

    while let Some((current, depth)) = queue.pop_front() {
        order.push(current.clone());
        if depth >= max_depth {
            continue;
        }
        if let Some(neighbors) = out_adjacency.get(&current) {
            for next in neighbors {
                if visited.insert(next.clone()) {
                    queue.push_back((next.clone(), depth + 1));
                }
            }
        }
    }

    order
}

fn symbol_name(node: &Node) -> Option<String> {
    match &node.payload {
        codegraph_core::NodePayload::Symbol(attrs) => Some(attrs.name.clone()),
        _ => None,
    }
}

fn entry_label(entry: &NodeId) -> String {
    entry
        .as_str()
        .rsplit(':')
        .next()
        .unwrap_or(entry.as_str())
        .to_string()
}

/// Language-aware entry-point name patterns (§4.8): exact `main`, handler
/// prefixes, and controller/handler suffixes.
fn matches_entry_pattern(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower == "main" {
        return true;
    }
    lower.starts_with("handle")
        || lower.starts_with("on")
        || name.ends_with("Controller")
        || name.ends_with("Handler")
}

fn is_excluded_path(file_path: &str) -> bool {
    std::path::Path::new(file_path)
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(|segment| {
            let lower = segment.to_lowercase();
            lower == "test" || lower == "tests" || lower == "__tests__" || lower == "utils" || lower == "util"
        })
        || file_path.ends_with(".test.ts")
        || file_path.ends_with("_test.go")
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

    fn config() -> DetectionConfig {
        DetectionConfig {
            community_floor: 5,
            process_min_steps: 3,
            process_max_depth: 32,
            process_cap_min: 20,
            process_cap_max: 300,
        }
    }

    #[test]
    fn traces_entry_point_through_its_call_chain() {
        let entry = symbol("a.ts", "handleRequest");
        let step1 = symbol("a.ts", "validate");
        let step2 = symbol("a.ts", "persist");
        let edges = vec![
            Edge::new(entry.id.clone(), step1.id.clone(), EdgeKind::Calls, Confidence::new(0.85), "same-file"),
            Edge::new(step1.id.clone(), step2.id.clone(), EdgeKind::Calls, Confidence::new(0.85), "same-file"),
        ];

        let (processes, steps) = detect_processes(&[&entry, &step1, &step2], &edges, &HashMap::new(), &config());
        assert_eq!(processes.len(), 1);
        assert_eq!(steps.len(), 3);
        assert_eq!(processes[0].payload_step_count(), 3);
    }

    #[test]
    fn short_trace_below_min_steps_is_dropped() {
        let entry = symbol("a.ts", "onClick");
        let step1 = symbol("a.ts", "doThing");
        let edges = vec![Edge::new(entry.id.clone(), step1.id.clone(), EdgeKind::Calls, Confidence::new(0.85), "same-file")];
        let (processes, _) = detect_processes(&[&entry, &step1], &edges, &HashMap::new(), &config());
        assert!(processes.is_empty());
    }

    #[test]
    fn test_file_entry_points_are_excluded() {
        let entry = symbol("src/tests/handleFixture.ts", "handleFixture");
        let s1 = symbol("src/tests/handleFixture.ts", "setup");
        let s2 = symbol("src/tests/handleFixture.ts", "teardown");
        let edges = vec![
            Edge::new(entry.id.clone(), s1.id.clone(), EdgeKind::Calls, Confidence::new(0.85), "same-file"),
            Edge::new(s1.id.clone(), s2.id.clone(), EdgeKind::Calls, Confidence::new(0.85), "same-file"),
        ];
        let (processes, _) = detect_processes(&[&entry, &s1, &s2], &edges, &HashMap::new(), &config());
        assert!(processes.is_empty());
    }
}

#[cfg(test)]
trait ProcessNodeTestExt {
    fn payload_step_count(&self) -> usize;
}

#[cfg(test)]
impl ProcessNodeTestExt for Node {
    fn payload_step_count(&self) -> usize {
        match &self.payload {
            codegraph_core::NodePayload::Process(attrs) => attrs.step_count,
            _ => 0,
        }
    }
}
