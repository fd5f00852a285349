use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitIntegrationError>;

#[derive(Debug, Error)]
pub enum GitIntegrationError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("repository not found at path: {0}")]
    RepoNotFound(String),

    #[error("invalid UTF-8 in path")]
    InvalidUtf8,
}
