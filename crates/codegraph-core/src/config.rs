use crate::error::{CodeGraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ignore-pattern configuration for the file walker (§4.1): exact segment
/// names, trailing suffixes, and file extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default = "IgnoreConfig::default_segments")]
    pub segments: Vec<String>,
    #[serde(default = "IgnoreConfig::default_suffixes")]
    pub suffixes: Vec<String>,
    #[serde(default = "IgnoreConfig::default_extensions")]
    pub extensions: Vec<String>,
}

impl IgnoreConfig {
    fn default_segments() -> Vec<String> {
        [
            ".git", "node_modules", "target", "dist", "build", "vendor", ".venv", "venv",
            "__pycache__", ".mypy_cache", ".pytest_cache", ".gitnexus",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn default_suffixes() -> Vec<String> {
        [".swp", ".swo", "~"].into_iter().map(String::from).collect()
    }

    fn default_extensions() -> Vec<String> {
        [
            "png", "jpg", "jpeg", "gif", "ico", "svg", "pdf", "zip", "tar", "gz", "so", "dylib",
            "dll", "exe", "class", "o", "a", "lock",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        IgnoreConfig {
            segments: Self::default_segments(),
            suffixes: Self::default_suffixes(),
            extensions: Self::default_extensions(),
        }
    }
}

/// Worker pool and batching knobs (§4.4, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    #[serde(default = "ParsingConfig::default_workers")]
    pub worker_count: usize,
    #[serde(default = "ParsingConfig::default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "ParsingConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "ParsingConfig::default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl ParsingConfig {
    fn default_workers() -> usize {
        4
    }
    fn default_batch_size() -> usize {
        20
    }
    fn default_timeout_secs() -> u64 {
        60
    }
    fn default_max_file_bytes() -> u64 {
        10 * 1024 * 1024
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        ParsingConfig {
            worker_count: Self::default_workers(),
            batch_size: Self::default_batch_size(),
            timeout_secs: Self::default_timeout_secs(),
            max_file_bytes: Self::default_max_file_bytes(),
        }
    }
}

/// Community/process detection knobs (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "DetectionConfig::default_community_floor")]
    pub community_floor: usize,
    #[serde(default = "DetectionConfig::default_process_min_steps")]
    pub process_min_steps: usize,
    #[serde(default = "DetectionConfig::default_process_max_depth")]
    pub process_max_depth: usize,
    #[serde(default = "DetectionConfig::default_process_cap_min")]
    pub process_cap_min: usize,
    #[serde(default = "DetectionConfig::default_process_cap_max")]
    pub process_cap_max: usize,
}

impl DetectionConfig {
    fn default_community_floor() -> usize {
        5
    }
    fn default_process_min_steps() -> usize {
        3
    }
    fn default_process_max_depth() -> usize {
        32
    }
    fn default_process_cap_min() -> usize {
        20
    }
    fn default_process_cap_max() -> usize {
        300
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            community_floor: Self::default_community_floor(),
            process_min_steps: Self::default_process_min_steps(),
            process_max_depth: Self::default_process_max_depth(),
            process_cap_min: Self::default_process_cap_min(),
            process_cap_max: Self::default_process_cap_max(),
        }
    }
}

/// Incremental coordinator threshold (§4.10, §8 property 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalConfig {
    #[serde(default = "IncrementalConfig::default_change_ratio_threshold")]
    pub change_ratio_threshold: f32,
}

impl IncrementalConfig {
    fn default_change_ratio_threshold() -> f32 {
        0.6
    }
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        IncrementalConfig {
            change_ratio_threshold: Self::default_change_ratio_threshold(),
        }
    }
}

/// Embedder defaults (§6): fixed dimensionality, batch size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "EmbeddingConfig::default_dimension")]
    pub dimension: usize,
    #[serde(default = "EmbeddingConfig::default_batch_size")]
    pub batch_size: usize,
}

impl EmbeddingConfig {
    fn default_dimension() -> usize {
        384
    }
    fn default_batch_size() -> usize {
        32
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            dimension: Self::default_dimension(),
            batch_size: Self::default_batch_size(),
        }
    }
}

/// Top-level layered configuration for the ingestion engine: defaults, then
/// an optional `codegraph.toml` in the repository, then `CODEGRAPH__*`
/// environment overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub incremental: IncrementalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl EngineConfig {
    /// Loads layered configuration: built-in defaults, an optional
    /// `codegraph.toml` at the repository root, then `CODEGRAPH__SECTION__KEY`
    /// environment variables (double underscore separator, matching the
    /// nested struct layout above).
    pub fn load(repo_root: &Path) -> Result<Self> {
        let defaults = config::Config::try_from(&EngineConfig::default())
            .map_err(|e| CodeGraphError::Configuration(e.to_string()))?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(repo_root.join("codegraph.toml")).required(false))
            .add_source(config::Environment::with_prefix("CODEGRAPH").separator("__"))
            .build()
            .map_err(|e| CodeGraphError::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| CodeGraphError::Configuration(e.to_string()))
    }

    /// Global registry file location (§6: "a user-home location").
    pub fn registry_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CodeGraphError::Configuration("could not determine home directory".into()))?;
        Ok(home.join(".codegraph").join("registry.json"))
    }

    /// Per-repository persistent layout root (§6: sibling `.gitnexus/`).
    pub fn gitnexus_dir(repo_root: &Path) -> PathBuf {
        repo_root.join(".gitnexus")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.parsing.worker_count, 4);
        assert_eq!(cfg.parsing.batch_size, 20);
        assert_eq!(cfg.incremental.change_ratio_threshold, 0.6);
        assert_eq!(cfg.embedding.dimension, 384);
        assert_eq!(cfg.detection.community_floor, 5);
    }

    #[test]
    fn load_without_repo_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.parsing.worker_count, 4);
    }

    #[test]
    fn env_override_applies() {
        std::env::set_var("CODEGRAPH__PARSING__WORKER_COUNT", "8");
        let dir = tempfile::tempdir().unwrap();
        let cfg = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.parsing.worker_count, 8);
        std::env::remove_var("CODEGRAPH__PARSING__WORKER_COUNT");
    }
}
