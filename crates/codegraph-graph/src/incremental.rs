use codegraph_core::{CodeGraphError, Edge, Node, NodeLabel, Result, RunMode, VcsProvider};
use codegraph_parser::SymbolTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Persisted run metadata (§6): `<gitnexus>/meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub repo_path: String,
    pub last_commit: String,
    pub indexed_at: String,
    pub stats: RunStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub files: usize,
    pub nodes: usize,
    pub edges: usize,
    pub communities: usize,
    pub processes: usize,
}

/// Reads `meta.json` if present. A missing or corrupt file is treated as "no
/// prior metadata" (§4.10 `Init → FullRebuild`) rather than a hard error.
pub fn load_metadata(gitnexus_dir: &Path) -> Option<RunMetadata> {
    let path = gitnexus_dir.join("meta.json");
    let bytes = std::fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn write_metadata(gitnexus_dir: &Path, meta: &RunMetadata) -> Result<()> {
    std::fs::create_dir_all(gitnexus_dir).map_err(CodeGraphError::Io)?;
    let bytes = serde_json::to_vec_pretty(meta)?;
    std::fs::write(gitnexus_dir.join("meta.json"), bytes).map_err(CodeGraphError::Io)?;
    Ok(())
}

/// The outcome of the coordinator's state machine (§4.10), carrying enough
/// information for the caller to act on it without re-deriving anything.
#[derive(Debug, Clone)]
pub struct IncrementalDecision {
    pub mode: RunMode,
    pub changed: Vec<String>,
    pub deleted: Vec<String>,
    pub reason: String,
}

/// `changed = diff(prior..current, filter=ACMR) ∪ uncommittedWorkingTreeChanges`,
/// sorted and deduplicated.
pub fn compute_changed_set(vcs: &dyn VcsProvider, repo_root: &Path, prior_commit: &str, current_commit: &str) -> Result<Vec<String>> {
    let mut set: BTreeSet<String> = vcs.changed_files(repo_root, prior_commit, current_commit)?.into_iter().collect();
    set.extend(vcs.uncommitted_changes(repo_root)?);
    Ok(set.into_iter().collect())
}

pub fn compute_deleted_set(vcs: &dyn VcsProvider, repo_root: &Path, prior_commit: &str, current_commit: &str) -> Result<Vec<String>> {
    let mut deleted: Vec<String> = vcs.deleted_files(repo_root, prior_commit, current_commit)?;
    deleted.sort();
    deleted.dedup();
    Ok(deleted)
}

/// Implements the state machine in §4.10. `loaded_file_count` is the number
/// of `File` nodes the caller successfully loaded from the store for the
/// unchanged portion of the graph — `0` if no load was attempted (e.g. full
/// rebuild path, where the caller need not load anything first).
pub fn decide(
    prior_commit: Option<&str>,
    current_commit: &str,
    force: bool,
    changed: &[String],
    deleted: &[String],
    loaded_file_count: usize,
    change_ratio_threshold: f32,
) -> IncrementalDecision {
    if !force {
        if let Some(prior) = prior_commit {
            if prior == current_commit {
                return IncrementalDecision {
                    mode: RunMode::AlreadyUpToDate,
                    changed: Vec::new(),
                    deleted: Vec::new(),
                    reason: "current commit matches last indexed commit".to_string(),
                };
            }
        }
    }

    if force || prior_commit.is_none() {
        let reason = if force { "force flag set" } else { "no prior metadata found" };
        return IncrementalDecision {
            mode: RunMode::Full,
            changed: changed.to_vec(),
            deleted: deleted.to_vec(),
            reason: reason.to_string(),
        };
    }

    if changed.is_empty() && deleted.is_empty() {
        return IncrementalDecision {
            mode: RunMode::AlreadyUpToDate,
            changed: Vec::new(),
            deleted: Vec::new(),
            reason: "commit advanced but no tracked file changed".to_string(),
        };
    }

    let denominator = loaded_file_count + changed.len();
    let ratio = if denominator == 0 { 0.0 } else { changed.len() as f32 / denominator as f32 };

    if ratio > change_ratio_threshold {
        return IncrementalDecision {
            mode: RunMode::Full,
            changed: changed.to_vec(),
            deleted: deleted.to_vec(),
            reason: format!("change ratio {ratio:.2} exceeds threshold {change_ratio_threshold:.2}"),
        };
    }

    IncrementalDecision {
        mode: RunMode::Incremental,
        changed: changed.to_vec(),
        deleted: deleted.to_vec(),
        reason: format!("change ratio {ratio:.2} within threshold {change_ratio_threshold:.2}"),
    }
}

/// Re-seeds C3 from symbols loaded out of the store's unchanged subgraph
/// (§4.10 step 3), so cross-file resolution for the newly parsed `changed`
/// files can still hit definitions that live in untouched files.
pub fn reseed_symbol_table(table: &mut SymbolTable, loaded_symbols: &[Node]) {
    for node in loaded_symbols {
        if !node.label.is_symbol() {
            continue;
        }
        if let codegraph_core::NodePayload::Symbol(attrs) = &node.payload {
            table.insert(&attrs.file_path, &attrs.name, node.id.clone(), node.label);
        }
    }
}

/// Symbol labels eligible for re-seeding; `Community`/`Process` are always
/// recomputed (§4.10 step 1) so they are never part of the loaded set.
pub fn is_reseedable(label: NodeLabel) -> bool {
    label.is_symbol()
}

/// The prior run's full node/edge set (§4.10 step 3's "loaded out of the
/// store"), kept as a side-channel JSON cache next to `meta.json` rather than
/// re-read through the store's query interface: the unchanged portion of a
/// run is pure bookkeeping and doesn't need a round trip through Cypher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Reads `nodes.json`. A missing or corrupt snapshot is treated the same way
/// as missing `meta.json` — the caller falls back to a full rebuild.
pub fn load_snapshot(gitnexus_dir: &Path) -> GraphSnapshot {
    let path = gitnexus_dir.join("nodes.json");
    std::fs::read(path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn write_snapshot(gitnexus_dir: &Path, snapshot: &GraphSnapshot) -> Result<()> {
    std::fs::create_dir_all(gitnexus_dir).map_err(CodeGraphError::Io)?;
    let bytes = serde_json::to_vec(snapshot)?;
    std::fs::write(gitnexus_dir.join("nodes.json"), bytes).map_err(CodeGraphError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_commits_without_force_is_already_up_to_date() {
        let decision = decide(Some("abc"), "abc", false, &[], &[], 0, 0.6);
        assert_eq!(decision.mode, RunMode::AlreadyUpToDate);
    }

    #[test]
    fn forced_run_is_always_full_even_with_matching_commits() {
        let decision = decide(Some("abc"), "abc", true, &[], &[], 0, 0.6);
        assert_eq!(decision.mode, RunMode::Full);
    }

    #[test]
    fn no_prior_metadata_is_full_rebuild() {
        let decision = decide(None, "abc", false, &["a.ts".to_string()], &[], 0, 0.6);
        assert_eq!(decision.mode, RunMode::Full);
    }

    #[test]
    fn small_change_ratio_is_incremental() {
        let changed = vec!["a.ts".to_string()];
        let decision = decide(Some("old"), "new", false, &changed, &[], 99, 0.6);
        assert_eq!(decision.mode, RunMode::Incremental);
    }

    #[test]
    fn large_change_ratio_falls_back_to_full() {
        let changed = vec!["a.ts".to_string(), "b.ts".to_string(), "c.ts".to_string()];
        let decision = decide(Some("old"), "new", false, &changed, &[], 1, 0.6);
        assert_eq!(decision.mode, RunMode::Full);
        assert!(decision.reason.contains("exceeds threshold"));
    }

    #[test]
    fn no_tracked_changes_despite_new_commit_is_already_up_to_date() {
        let decision = decide(Some("old"), "new", false, &[], &[], 10, 0.6);
        assert_eq!(decision.mode, RunMode::AlreadyUpToDate);
    }

    #[test]
    fn missing_snapshot_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = load_snapshot(dir.path());
        assert!(snapshot.nodes.is_empty());
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn snapshot_round_trips() {
        use codegraph_core::NodeId;

        let dir = tempfile::tempdir().unwrap();
        let snapshot = GraphSnapshot {
            nodes: vec![Node::file("a.ts", "content".into())],
            edges: vec![Edge::defines(NodeId::file("a.ts"), NodeId::for_definition(NodeLabel::Function, "a.ts", "foo"))],
        };
        write_snapshot(dir.path(), &snapshot).unwrap();
        let loaded = load_snapshot(dir.path());
        assert_eq!(loaded.nodes.len(), 1);
        assert_eq!(loaded.edges.len(), 1);
    }
}
