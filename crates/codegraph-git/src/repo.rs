use crate::errors::{GitIntegrationError, Result};
use git2::{Delta, DiffOptions, Repository, RepositoryOpenFlags, StatusOptions};
use std::path::{Path, PathBuf};

/// Wraps a single repository handle for the version-control interface
/// (§6): `current_commit`, `changed_files`, `deleted_files`,
/// `uncommitted_changes`. All returned paths are repo-relative and
/// forward-slash normalized.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let repo = Repository::open_ext(path_ref, RepositoryOpenFlags::empty(), &[] as &[&std::ffi::OsStr])
            .map_err(|_| GitIntegrationError::RepoNotFound(path_ref.display().to_string()))?;
        Ok(GitRepository { repo })
    }

    /// The commit at `HEAD`, used to gate up-to-date checks (§6).
    pub fn current_commit(&self) -> Result<String> {
        let head = self.repo.head()?;
        let oid = head
            .target()
            .ok_or_else(|| GitIntegrationError::RepoNotFound("HEAD has no target (unborn branch)".into()))?;
        Ok(oid.to_string())
    }

    /// Files added, copied, modified, or renamed between two commits
    /// (diff filter `A,C,M,R`, §6).
    pub fn changed_files(&self, from: &str, to: &str) -> Result<Vec<String>> {
        self.diff_paths(from, to, |status| {
            matches!(status, Delta::Added | Delta::Copied | Delta::Modified | Delta::Renamed)
        })
    }

    /// Files deleted between two commits (diff filter `D`, §6).
    pub fn deleted_files(&self, from: &str, to: &str) -> Result<Vec<String>> {
        self.diff_paths(from, to, |status| matches!(status, Delta::Deleted))
    }

    /// Working-tree diff against `HEAD`, covering both staged and unstaged
    /// changes plus untracked files (§6).
    pub fn uncommitted_changes(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut paths: Vec<String> = statuses
            .iter()
            .filter_map(|entry| entry.path().map(normalize))
            .collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    fn diff_paths(&self, from: &str, to: &str, keep: impl Fn(Delta) -> bool) -> Result<Vec<String>> {
        let from_tree = self.repo.revparse_single(from)?.peel_to_commit()?.tree()?;
        let to_tree = self.repo.revparse_single(to)?.peel_to_commit()?.tree()?;
        let mut opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut opts))?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            if !keep(delta.status()) {
                continue;
            }
            let file = if delta.status() == Delta::Deleted {
                delta.old_file()
            } else {
                delta.new_file()
            };
            if let Some(path) = file.path() {
                paths.push(normalize_pathbuf(path.to_path_buf()));
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn normalize_pathbuf(path: PathBuf) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;

    fn init_repo(dir: &Path) {
        let status = Command::new("git").arg("init").arg("-q").current_dir(dir).status().unwrap();
        assert!(status.success());
        Command::new("git").args(["config", "user.email", "test@example.com"]).current_dir(dir).status().unwrap();
        Command::new("git").args(["config", "user.name", "Test"]).current_dir(dir).status().unwrap();
    }

    fn commit_all(dir: &Path, message: &str) -> String {
        Command::new("git").args(["add", "-A"]).current_dir(dir).status().unwrap();
        Command::new("git").args(["commit", "-q", "-m", message]).current_dir(dir).status().unwrap();
        let output = Command::new("git").args(["rev-parse", "HEAD"]).current_dir(dir).output().unwrap();
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    #[test]
    fn reports_changed_and_deleted_files_between_commits() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        fs::write(dir.path().join("a.ts"), "a").unwrap();
        fs::write(dir.path().join("b.ts"), "b").unwrap();
        let first = commit_all(dir.path(), "first");

        fs::write(dir.path().join("a.ts"), "a2").unwrap();
        fs::remove_file(dir.path().join("b.ts")).unwrap();
        fs::write(dir.path().join("c.ts"), "c").unwrap();
        let second = commit_all(dir.path(), "second");

        let repo = GitRepository::open(dir.path()).unwrap();
        assert_eq!(repo.current_commit().unwrap(), second);

        let mut changed = repo.changed_files(&first, &second).unwrap();
        changed.sort();
        assert_eq!(changed, vec!["a.ts".to_string(), "c.ts".to_string()]);

        let deleted = repo.deleted_files(&first, &second).unwrap();
        assert_eq!(deleted, vec!["b.ts".to_string()]);
    }

    #[test]
    fn uncommitted_changes_includes_untracked_files() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        fs::write(dir.path().join("a.ts"), "a").unwrap();
        commit_all(dir.path(), "first");
        fs::write(dir.path().join("new.ts"), "new").unwrap();

        let repo = GitRepository::open(dir.path()).unwrap();
        let changes = repo.uncommitted_changes().unwrap();
        assert!(changes.contains(&"new.ts".to_string()));
    }
}
