use codegraph_core::{CodeGraphError, EngineConfig, Result};
use codegraph_graph::RunMetadata;
use serde::{Deserialize, Serialize};

/// The global `~/.codegraph/registry.json` listing every repository this
/// binary has ever indexed (§6). One entry per repository, keyed by its
/// absolute path; a repeat `analyze` replaces the prior entry rather than
/// appending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub repositories: Vec<RunMetadata>,
}

pub fn load() -> Registry {
    let Ok(path) = EngineConfig::registry_path() else {
        return Registry::default();
    };
    std::fs::read(path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn save(registry: &Registry) -> Result<()> {
    let path = EngineConfig::registry_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(CodeGraphError::Io)?;
    }
    let bytes = serde_json::to_vec_pretty(registry)?;
    std::fs::write(path, bytes).map_err(CodeGraphError::Io)?;
    Ok(())
}

/// Replaces any existing entry for `meta.repo_path`, then appends it.
pub fn upsert(registry: &mut Registry, meta: RunMetadata) {
    registry.repositories.retain(|entry| entry.repo_path != meta.repo_path);
    registry.repositories.push(meta);
    registry.repositories.sort_by(|a, b| a.repo_path.cmp(&b.repo_path));
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_graph::RunStats;

    fn meta(repo_path: &str, commit: &str) -> RunMetadata {
        RunMetadata {
            repo_path: repo_path.to_string(),
            last_commit: commit.to_string(),
            indexed_at: "2026-01-01T00:00:00Z".to_string(),
            stats: RunStats::default(),
        }
    }

    #[test]
    fn upsert_replaces_existing_entry_for_same_repo() {
        let mut registry = Registry::default();
        upsert(&mut registry, meta("/repo/a", "commit1"));
        upsert(&mut registry, meta("/repo/a", "commit2"));
        assert_eq!(registry.repositories.len(), 1);
        assert_eq!(registry.repositories[0].last_commit, "commit2");
    }

    #[test]
    fn upsert_keeps_entries_sorted_by_path() {
        let mut registry = Registry::default();
        upsert(&mut registry, meta("/repo/b", "c1"));
        upsert(&mut registry, meta("/repo/a", "c2"));
        let paths: Vec<&str> = registry.repositories.iter().map(|e| e.repo_path.as_str()).collect();
        assert_eq!(paths, vec!["/repo/a", "/repo/b"]);
    }
}
