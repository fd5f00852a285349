//! Version-control interface for the ingestion engine (§6): resolves the
//! current commit and diffs between commits using libgit2.

pub mod errors;
pub mod provider;
pub mod repo;

pub use errors::{GitIntegrationError, Result};
pub use provider::Git2VcsProvider;
pub use repo::GitRepository;
