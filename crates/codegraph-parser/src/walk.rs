use codegraph_core::{CodeGraphError, FileWalker, IgnoreConfig, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::Path;
use tracing::warn;

/// Implements C1: a finite, deduplicated, sorted sequence of
/// `(relativePath, utf8Bytes)` pairs, with paths normalized to forward
/// slashes and made relative to the repository root (§4.1).
pub struct IgnoreFilterWalker {
    config: IgnoreConfig,
    extension_glob: GlobSet,
}

impl IgnoreFilterWalker {
    pub fn new(config: IgnoreConfig) -> Self {
        let mut builder = GlobSetBuilder::new();
        for ext in &config.extensions {
            if let Ok(glob) = Glob::new(&format!("*.{}", ext)) {
                builder.add(glob);
            } else {
                warn!("invalid extension ignore pattern: {}", ext);
            }
        }
        let extension_glob = builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap());
        IgnoreFilterWalker { config, extension_glob }
    }

    fn is_ignored(&self, relative_path: &str, file_name: &str) -> bool {
        if relative_path
            .split('/')
            .any(|segment| self.config.segments.iter().any(|s| s == segment))
        {
            return true;
        }
        if self.config.suffixes.iter().any(|suffix| file_name.ends_with(suffix.as_str())) {
            return true;
        }
        if self.extension_glob.is_match(file_name) {
            return true;
        }
        false
    }
}

impl FileWalker for IgnoreFilterWalker {
    fn walk(&self, repo_root: &Path) -> Result<Vec<(String, Vec<u8>)>> {
        if !repo_root.is_dir() {
            return Err(CodeGraphError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("repository root is not a directory: {}", repo_root.display()),
            )));
        }

        let walker = WalkBuilder::new(repo_root)
            .hidden(false)
            .git_ignore(false)
            .git_exclude(false)
            .ignore(false)
            .build();

        let mut results = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable walk entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            let relative = match path.strip_prefix(repo_root) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let normalized = normalize_path(relative);
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if self.is_ignored(&normalized, file_name) {
                continue;
            }

            match std::fs::read(path) {
                Ok(bytes) => results.push((normalized, bytes)),
                Err(e) => warn!("skipping unreadable file {}: {}", normalized, e),
            }
        }

        results.sort_by(|a, b| a.0.cmp(&b.0));
        results.dedup_by(|a, b| a.0 == b.0);
        Ok(results)
    }
}

fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn ignores_configured_segments_and_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/lib.js"), b"ignored").unwrap();
        fs::write(dir.path().join("main.rs"), b"fn main() {}").unwrap();
        fs::write(dir.path().join("logo.png"), b"binary").unwrap();

        let walker = IgnoreFilterWalker::new(IgnoreConfig::default());
        let files = walker.walk(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|(p, _)| p.as_str()).collect();

        assert!(paths.contains(&"main.rs"));
        assert!(!paths.iter().any(|p| p.starts_with("node_modules/")));
        assert!(!paths.contains(&"logo.png"));
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.rs"), b"").unwrap();
        fs::write(dir.path().join("a.rs"), b"").unwrap();

        let walker = IgnoreFilterWalker::new(IgnoreConfig::default());
        let files = walker.walk(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn unreadable_root_is_an_io_error() {
        let walker = IgnoreFilterWalker::new(IgnoreConfig::default());
        let err = walker.walk(Path::new("/nonexistent/path/xyz")).unwrap_err();
        assert!(matches!(err, CodeGraphError::Io(_)));
    }
}
