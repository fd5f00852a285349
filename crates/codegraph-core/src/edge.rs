use crate::ids::NodeId;
use crate::types::{Confidence, EdgeKind};
use serde::{Deserialize, Serialize};

/// A graph edge: typed, confidence-scored, with a human-readable reason and
/// an optional ordinal `step` used only by `STEP_IN_PROCESS` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub confidence: Confidence,
    pub reason: String,
    pub step: Option<u32>,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind, confidence: Confidence, reason: impl Into<String>) -> Self {
        Edge {
            from,
            to,
            kind,
            confidence,
            reason: reason.into(),
            step: None,
        }
    }

    pub fn contains(parent: NodeId, child: NodeId) -> Self {
        Edge::new(parent, child, EdgeKind::Contains, Confidence::CERTAIN, "containment")
    }

    pub fn defines(file: NodeId, symbol: NodeId) -> Self {
        Edge::new(file, symbol, EdgeKind::Defines, Confidence::CERTAIN, "definition")
    }

    pub fn imports(from_file: NodeId, to_file: NodeId) -> Self {
        Edge::new(from_file, to_file, EdgeKind::Imports, Confidence::CERTAIN, "import-resolved")
    }

    pub fn member_of(symbol: NodeId, community: NodeId) -> Self {
        Edge::new(symbol, community, EdgeKind::MemberOf, Confidence::CERTAIN, "community-membership")
    }

    pub fn step_in_process(symbol: NodeId, process: NodeId, step: u32) -> Self {
        let mut edge = Edge::new(
            symbol,
            process,
            EdgeKind::StepInProcess,
            Confidence::CERTAIN,
            "process-trace",
        );
        edge.step = Some(step);
        edge
    }

    /// The `(from, to, kind)` identity used to de-duplicate edges at persist
    /// time (§4.6 "Duplicates ... are allowed but de-duplicated at persist
    /// time").
    pub fn dedup_key(&self) -> (String, String, EdgeKind) {
        (self.from.as_str().to_string(), self.to.as_str().to_string(), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeLabel;

    #[test]
    fn confidence_is_always_in_bounds() {
        let from = NodeId::for_definition(NodeLabel::Function, "a.ts", "foo");
        let to = NodeId::for_definition(NodeLabel::Function, "b.ts", "bar");
        let edge = Edge::new(from, to, EdgeKind::Calls, Confidence::new(5.0), "same-file");
        assert!(edge.confidence.value() <= 1.0);
        assert!(edge.confidence.value() >= 0.0);
    }
}
