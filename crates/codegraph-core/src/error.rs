use thiserror::Error;

/// The three error kinds the rest of the engine reasons about: a parse or
/// resolution miss on one item, a phase whose output is skipped wholesale,
/// or a run-ending failure that must roll back persistence.
#[derive(Debug, Error)]
pub enum CodeGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("not a version-control repository: {0}")]
    NotARepository(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, CodeGraphError>;

impl CodeGraphError {
    /// Whether this error should abort the whole run (§7 "Fatal"), as
    /// opposed to being logged and skipped by the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CodeGraphError::Fatal(_) | CodeGraphError::NotARepository(_) | CodeGraphError::Invariant(_)
        )
    }
}
