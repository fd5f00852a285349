use crate::edge::Edge;
use crate::error::Result;
use crate::ids::NodeId;
use crate::node::Node;
use crate::types::Language;
use async_trait::async_trait;

/// A source of `(relativePath, bytes)` pairs, surviving the ignore filter
/// (§4.1). The cloning/zip/file-walk layer that produces these pairs is out
/// of scope; this trait is the seam the rest of the engine depends on.
pub trait FileWalker {
    fn walk(&self, repo_root: &std::path::Path) -> Result<Vec<(String, Vec<u8>)>>;
}

/// Per-file definition/call/import/heritage extraction (§4.4). One value
/// implements this per language; the parsing processor dispatches by
/// [`Language`].
pub trait SymbolExtractor {
    fn language(&self) -> Language;
    fn extract(&self, file_path: &str, source: &str) -> Result<ExtractionResult>;
}

/// Everything a single file contributes to the graph before cross-file
/// resolution (§4.4 step 4-5).
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub definitions: Vec<Node>,
    pub imports: Vec<ImportSpecifier>,
    pub call_sites: Vec<CallSite>,
    pub heritage: Vec<HeritageRef>,
}

#[derive(Debug, Clone)]
pub struct ImportSpecifier {
    pub raw: String,
    pub is_relative: bool,
}

#[derive(Debug, Clone)]
pub struct CallSite {
    pub caller_file: String,
    /// The enclosing symbol's id, if the call occurs inside one; `None`
    /// means module-top-level (§4.6).
    pub caller_symbol: Option<NodeId>,
    pub called_name: String,
}

#[derive(Debug, Clone)]
pub struct HeritageRef {
    pub subject: NodeId,
    pub referenced_name: String,
    pub kind: HeritageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeritageKind {
    Extends,
    Implements,
}

/// The embedded graph store's interface (§6), treated as a black box: bulk
/// COPY, prepared Cypher, vector index, full-text index.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn init(&mut self, path: &std::path::Path) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
    async fn execute_query(&self, cypher: &str) -> Result<Vec<serde_json::Value>>;
    async fn copy_csv(&self, table: &str, csv_path: &std::path::Path, options: &str) -> Result<()>;
    async fn create_vector_index(&self, table: &str, index_name: &str, column: &str, metric: &str) -> Result<()>;
    async fn create_fts_index(&self, table: &str, index_name: &str, columns: &[&str], stemmer: &str) -> Result<()>;
}

/// A batched text→vector function (§6). `dimension()` must equal the length
/// of every returned vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    async fn dispose(&mut self) -> Result<()>;
}

/// The version-control interface (§6), invoked via subprocess or library
/// bindings by the implementing crate.
pub trait VcsProvider {
    fn current_commit(&self, repo_root: &std::path::Path) -> Result<String>;
    fn changed_files(&self, repo_root: &std::path::Path, from: &str, to: &str) -> Result<Vec<String>>;
    fn deleted_files(&self, repo_root: &std::path::Path, from: &str, to: &str) -> Result<Vec<String>>;
    fn uncommitted_changes(&self, repo_root: &std::path::Path) -> Result<Vec<String>>;
}

/// A sink for the nodes and edges produced by a pipeline run, independent of
/// the concrete [`GraphStore`] — used by the persister (C9) to stage CSVs
/// before a bulk COPY.
pub trait GraphSink {
    fn push_node(&mut self, node: Node);
    fn push_edge(&mut self, edge: Edge);
}
