pub mod config;
pub mod edge;
pub mod error;
pub mod ids;
pub mod node;
pub mod traits;
pub mod types;

pub use config::{DetectionConfig, EmbeddingConfig, EngineConfig, IgnoreConfig, IncrementalConfig, ParsingConfig};
pub use edge::Edge;
pub use error::{CodeGraphError, Result};
pub use ids::NodeId;
pub use node::{CommunityAttrs, FileAttrs, FolderAttrs, Node, NodePayload, ProcessAttrs, SymbolAttrs};
pub use traits::{
    CallSite, Embedder, ExtractionResult, FileWalker, GraphSink, GraphStore, HeritageKind, HeritageRef,
    ImportSpecifier, SymbolExtractor, VcsProvider,
};
pub use types::{Confidence, EdgeKind, Language, NodeLabel, ResolutionReason, RunMode, Span};
