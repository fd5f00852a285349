//! Embedding provider for the ingestion engine (§6). The `Embedder` trait
//! itself lives in `codegraph-core`, which the graph store and pipeline
//! depend on instead of this crate directly; this crate supplies the one
//! concrete implementation that needs no external model.

pub mod hashing;

pub use hashing::{validate_dimension, HashingEmbedder};
