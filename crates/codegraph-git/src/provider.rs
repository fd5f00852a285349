use crate::repo::GitRepository;
use codegraph_core::{CodeGraphError, Result, VcsProvider};
use std::path::Path;

/// Adapts [`GitRepository`] to the engine-facing [`VcsProvider`] seam,
/// translating `GitIntegrationError` into the engine's error taxonomy
/// (§6, §7).
#[derive(Default)]
pub struct Git2VcsProvider;

impl VcsProvider for Git2VcsProvider {
    fn current_commit(&self, repo_root: &Path) -> Result<String> {
        GitRepository::open(repo_root)
            .and_then(|r| r.current_commit())
            .map_err(to_engine_error)
    }

    fn changed_files(&self, repo_root: &Path, from: &str, to: &str) -> Result<Vec<String>> {
        GitRepository::open(repo_root)
            .and_then(|r| r.changed_files(from, to))
            .map_err(to_engine_error)
    }

    fn deleted_files(&self, repo_root: &Path, from: &str, to: &str) -> Result<Vec<String>> {
        GitRepository::open(repo_root)
            .and_then(|r| r.deleted_files(from, to))
            .map_err(to_engine_error)
    }

    fn uncommitted_changes(&self, repo_root: &Path) -> Result<Vec<String>> {
        GitRepository::open(repo_root)
            .and_then(|r| r.uncommitted_changes())
            .map_err(to_engine_error)
    }
}

fn to_engine_error(err: crate::errors::GitIntegrationError) -> CodeGraphError {
    match err {
        crate::errors::GitIntegrationError::RepoNotFound(path) => CodeGraphError::NotARepository(path),
        other => CodeGraphError::Git(other.to_string()),
    }
}
