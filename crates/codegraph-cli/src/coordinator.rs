use codegraph_core::{
    CallSite, CodeGraphError, Edge, EdgeKind, EmbeddingConfig, Embedder, EngineConfig, FileWalker, GraphStore,
    HeritageRef, ImportSpecifier, Language, Node, NodeId, NodeLabel, NodePayload, Result, RunMode, VcsProvider,
};
use codegraph_git::Git2VcsProvider;
use codegraph_graph::{
    compute_changed_set, compute_deleted_set, database_path, decide, detect_communities_and_processes,
    is_reseedable, load_metadata, load_snapshot, persist_graph, reseed_symbol_table, resolve_calls,
    resolve_heritage, resolve_imports, write_metadata, write_snapshot, Graph, GraphSnapshot, ImportMap,
    KuzuGraphStore, RunMetadata, RunStats,
};
use codegraph_parser::{IgnoreFilterWalker, ParsePipeline, SymbolTable};
use codegraph_vector::HashingEmbedder;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// What `analyze` reports back to the CLI layer for printing and for the
/// registry update; distinct from [`codegraph_graph::RunMetadata`] because it
/// also carries the run's aggregated non-fatal warnings (§7).
pub struct RunOutcome {
    pub mode: RunMode,
    pub reason: String,
    pub stats: RunStats,
    pub warnings: Vec<String>,
    pub meta: RunMetadata,
}

/// Walks up from `start` looking for the enclosing git working directory,
/// the "nearest version-control root" the CLI's `path` argument defaults to.
pub fn discover_repo_root(start: &Path) -> Option<PathBuf> {
    git2::Repository::discover(start)
        .ok()
        .and_then(|repo| repo.workdir().map(|p| p.to_path_buf()))
}

/// Runs C1 through C10 against `repo_root` and persists the result. Returns
/// [`CodeGraphError::NotARepository`] if `repo_root` has no `.git`, and any
/// error whose [`CodeGraphError::is_fatal`] is true on an unrecoverable
/// failure partway through (§7 "Fatal").
pub async fn run_analyze(repo_root: &Path, force: bool, skip_embeddings: bool) -> Result<RunOutcome> {
    let repo_root = repo_root.canonicalize().map_err(CodeGraphError::Io)?;
    let vcs = Git2VcsProvider::default();
    let current_commit = vcs.current_commit(&repo_root)?;

    let config = EngineConfig::load(&repo_root)?;
    let gitnexus_dir = EngineConfig::gitnexus_dir(&repo_root);

    let prior_meta = load_metadata(&gitnexus_dir);
    let prior_commit = prior_meta.as_ref().map(|m| m.last_commit.clone());

    let changed = match &prior_commit {
        Some(pc) => compute_changed_set(&vcs, &repo_root, pc, &current_commit)?,
        None => Vec::new(),
    };
    let deleted = match &prior_commit {
        Some(pc) => compute_deleted_set(&vcs, &repo_root, pc, &current_commit)?,
        None => Vec::new(),
    };

    let snapshot = load_snapshot(&gitnexus_dir);
    let loaded_file_count = snapshot.nodes.iter().filter(|n| n.label == NodeLabel::File).count();

    let decision = decide(
        prior_commit.as_deref(),
        &current_commit,
        force,
        &changed,
        &deleted,
        loaded_file_count,
        config.incremental.change_ratio_threshold,
    );

    if decision.mode == RunMode::AlreadyUpToDate {
        info!(reason = %decision.reason, "repository already up to date");
        let meta = prior_meta.unwrap_or_else(|| RunMetadata {
            repo_path: repo_root.to_string_lossy().into_owned(),
            last_commit: current_commit.clone(),
            indexed_at: chrono::Utc::now().to_rfc3339(),
            stats: RunStats::default(),
        });
        return Ok(RunOutcome {
            mode: decision.mode,
            reason: decision.reason,
            stats: meta.stats.clone(),
            warnings: Vec::new(),
            meta,
        });
    }

    let walker = IgnoreFilterWalker::new(config.ignore.clone());
    let all_files = walker.walk(&repo_root)?;
    let all_paths: HashSet<String> = all_files.iter().map(|(p, _)| p.clone()).collect();

    let changed_set: HashSet<&str> = decision.changed.iter().map(|s| s.as_str()).collect();
    let deleted_set: HashSet<&str> = decision.deleted.iter().map(|s| s.as_str()).collect();

    let files_to_parse: Vec<(String, Vec<u8>)> = match decision.mode {
        RunMode::Full => all_files.clone(),
        RunMode::Incremental => all_files
            .iter()
            .filter(|(path, _)| changed_set.contains(path.as_str()))
            .cloned()
            .collect(),
        RunMode::AlreadyUpToDate => unreachable!("handled above"),
    };

    info!(mode = %decision.mode, reason = %decision.reason, files = files_to_parse.len(), "starting pipeline run");

    let progress = parse_progress_bar(files_to_parse.len());
    let pipeline = ParsePipeline::new(config.parsing.clone());
    let (outcomes, parse_warnings) = pipeline.parse_all(files_to_parse);
    progress.finish_with_message(format!("parsed {} files", outcomes.len()));
    let mut warnings: Vec<String> = parse_warnings.iter().map(|w| format!("{}: {:?}", w.file_path, w.reason)).collect();

    let mut graph = Graph::new();
    build_folder_scaffold(&mut graph, &all_files);

    let mut symbol_table = SymbolTable::new();
    for outcome in &outcomes {
        for definition in &outcome.extraction.definitions {
            graph.upsert_node(definition.clone());
            graph.add_edge(Edge::defines(NodeId::file(&outcome.file_path), definition.id.clone()));
            if let NodePayload::Symbol(attrs) = &definition.payload {
                symbol_table.insert(&attrs.file_path, &attrs.name, definition.id.clone(), definition.label);
            }
        }
    }

    if decision.mode == RunMode::Incremental {
        carry_forward_unchanged(&mut graph, &mut symbol_table, &snapshot, &all_paths, &changed_set, &deleted_set);
    }

    let import_inputs: Vec<(String, Language, Vec<ImportSpecifier>)> = outcomes
        .iter()
        .map(|o| (o.file_path.clone(), o.language, o.extraction.imports.clone()))
        .collect();
    let import_map: ImportMap = resolve_imports(&import_inputs, &all_paths);
    for (from_file, targets) in &import_map {
        for to_file in targets {
            graph.add_edge(Edge::imports(NodeId::file(from_file), NodeId::file(to_file)));
        }
    }

    let call_sites: Vec<CallSite> = outcomes.iter().flat_map(|o| o.extraction.call_sites.clone()).collect();
    for edge in resolve_calls(&call_sites, &symbol_table, &import_map) {
        graph.add_edge(edge);
    }

    let heritage_refs: Vec<HeritageRef> = outcomes.iter().flat_map(|o| o.extraction.heritage.clone()).collect();
    let owning_file = |id: &NodeId| owning_file_component(id).map(str::to_string);
    for edge in resolve_heritage(&heritage_refs, &owning_file, &symbol_table, &import_map) {
        graph.add_edge(edge);
    }

    let symbol_nodes: Vec<Node> = graph.nodes().filter(|n| n.label.is_symbol()).cloned().collect();
    let symbol_refs: Vec<&Node> = symbol_nodes.iter().collect();
    let (derived_nodes, derived_edges) = detect_communities_and_processes(&symbol_refs, graph.edges(), &config.detection);
    for node in derived_nodes {
        graph.upsert_node(node);
    }
    for edge in derived_edges {
        graph.add_edge(edge);
    }

    let db_path = database_path(&gitnexus_dir);
    let mut store = KuzuGraphStore::new();
    store.init(&db_path).await?;

    match persist_graph(&graph, &store, &gitnexus_dir).await {
        Ok(report) => warnings.extend(report.warnings),
        Err(e) => {
            // Roll back: drop the connection, then truncate the half-written
            // database rather than leave a partial one in place (§7 "Fatal").
            let _ = store.close().await;
            std::fs::remove_dir_all(&db_path).ok();
            std::fs::remove_file(&db_path).ok();
            return Err(e);
        }
    }

    if !skip_embeddings {
        if let Err(e) = embed_symbols(&store, &graph, &config.embedding).await {
            warnings.push(format!("embedding step failed: {e}"));
        }
    }

    store.close().await?;

    let communities = graph.nodes().filter(|n| n.label == NodeLabel::Community).count();
    let processes = graph.nodes().filter(|n| n.label == NodeLabel::Process).count();
    let stats = RunStats {
        files: all_files.len(),
        nodes: graph.node_count(),
        edges: graph.edges().len(),
        communities,
        processes,
    };

    let meta = RunMetadata {
        repo_path: repo_root.to_string_lossy().into_owned(),
        last_commit: current_commit,
        indexed_at: chrono::Utc::now().to_rfc3339(),
        stats: stats.clone(),
    };
    write_metadata(&gitnexus_dir, &meta)?;

    let snapshot_nodes: Vec<Node> = graph.nodes().cloned().collect();
    let snapshot_edges: Vec<Edge> = graph.edges().to_vec();
    write_snapshot(&gitnexus_dir, &GraphSnapshot { nodes: snapshot_nodes, edges: snapshot_edges })?;

    Ok(RunOutcome { mode: decision.mode, reason: decision.reason, stats, warnings, meta })
}

/// Re-seeds the unchanged portion of a run (§4.10 step 3) from the prior
/// run's node/edge snapshot: symbols belonging to files that weren't
/// reparsed this run are carried over verbatim, and so are the edges between
/// them. `Community`/`MemberOf`/`StepInProcess` are never carried; they're
/// always recomputed from the fresh symbol/edge set.
fn carry_forward_unchanged(
    graph: &mut Graph,
    symbol_table: &mut SymbolTable,
    snapshot: &GraphSnapshot,
    all_paths: &HashSet<String>,
    changed_set: &HashSet<&str>,
    deleted_set: &HashSet<&str>,
) {
    let carried_symbols: Vec<Node> = snapshot
        .nodes
        .iter()
        .filter(|n| is_reseedable(n.label))
        .filter(|n| {
            n.file_path()
                .map(|fp| !changed_set.contains(fp) && !deleted_set.contains(fp) && all_paths.contains(fp))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    reseed_symbol_table(symbol_table, &carried_symbols);
    for node in &carried_symbols {
        graph.upsert_node(node.clone());
        let file_path = node.file_path().expect("filtered to symbol nodes carrying a file path");
        graph.add_edge(Edge::defines(NodeId::file(file_path), node.id.clone()));
    }

    for edge in &snapshot.edges {
        if matches!(edge.kind, EdgeKind::MemberOf | EdgeKind::StepInProcess) {
            continue;
        }
        if is_stale(&edge.from, changed_set, deleted_set) || is_stale(&edge.to, changed_set, deleted_set) {
            continue;
        }
        if graph.contains_node(&edge.from) && graph.contains_node(&edge.to) {
            graph.add_edge(edge.clone());
        }
    }
}

fn is_stale(id: &NodeId, changed_set: &HashSet<&str>, deleted_set: &HashSet<&str>) -> bool {
    owning_file_component(id)
        .map(|fp| changed_set.contains(fp) || deleted_set.contains(fp))
        .unwrap_or(false)
}

/// Pulls the `filePath` segment out of a definition node id (`label:filePath:name`),
/// returning `None` for derived (`Community`/`Process`) ids, which carry no
/// owning file.
fn owning_file_component(id: &NodeId) -> Option<&str> {
    let mut parts = id.as_str().splitn(3, ':');
    let label = parts.next()?;
    if label == NodeLabel::Community.as_str() || label == NodeLabel::Process.as_str() {
        return None;
    }
    let file_path = parts.next()?;
    if file_path.is_empty() {
        None
    } else {
        Some(file_path)
    }
}

fn build_folder_scaffold(graph: &mut Graph, all_files: &[(String, Vec<u8>)]) {
    graph.upsert_node(Node::folder(""));
    let mut seen_folders: HashSet<String> = HashSet::new();

    for (path, bytes) in all_files {
        let content = String::from_utf8_lossy(bytes).into_owned();
        graph.upsert_node(Node::file(path, content));

        let segments: Vec<&str> = path.split('/').collect();
        let folder_segments = &segments[..segments.len().saturating_sub(1)];
        let mut parent = String::new();
        for segment in folder_segments {
            let folder_path = if parent.is_empty() { (*segment).to_string() } else { format!("{parent}/{segment}") };
            if seen_folders.insert(folder_path.clone()) {
                graph.upsert_node(Node::folder(&folder_path));
            }
            let parent_id = if parent.is_empty() { NodeId::root_folder() } else { NodeId::folder(&parent) };
            graph.add_edge(Edge::contains(parent_id, NodeId::folder(&folder_path)));
            parent = folder_path;
        }

        let parent_id = if parent.is_empty() { NodeId::root_folder() } else { NodeId::folder(&parent) };
        graph.add_edge(Edge::contains(parent_id, NodeId::file(path)));
    }
}

/// Populates the `Symbol.embedding` column after the bulk COPY (§6): COPY
/// leaves it null since a variable-length float array doesn't round-trip
/// cleanly through the CSV loader, so embeddings are written as a follow-up
/// batch of `SET` statements instead.
async fn embed_symbols(store: &KuzuGraphStore, graph: &Graph, config: &EmbeddingConfig) -> Result<()> {
    let mut embedder = HashingEmbedder::new(config.dimension);
    let symbols: Vec<&Node> = graph.nodes().filter(|n| n.label.is_symbol()).collect();

    for batch in symbols.chunks(config.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|n| symbol_content(n)).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        for (node, vector) in batch.iter().zip(vectors) {
            let literal = vector.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
            let cypher = format!("MATCH (s:Symbol {{id: '{}'}}) SET s.embedding = [{}]", escape_literal(node.id.as_str()), literal);
            if let Err(e) = store.execute_query(&cypher).await {
                warn!(id = %node.id, error = %e, "failed to write embedding, skipping symbol");
            }
        }
    }

    embedder.dispose().await
}

fn symbol_content(node: &Node) -> String {
    match &node.payload {
        NodePayload::Symbol(attrs) => attrs.content.clone(),
        _ => String::new(),
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "\\'")
}

/// A determinate bar for the parse step when the file count is known up
/// front, falling back to a spinner for an empty incremental batch so the
/// run still shows signs of life while the pool spins up. Steps only
/// forward — there's no retrogression to account for since `parse_all`
/// drives it start to finish in one call.
fn parse_progress_bar(file_count: usize) -> ProgressBar {
    let bar = ProgressBar::new(file_count as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} parsing {pos}/{len} files {wide_bar}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::NodeId as Id;

    #[test]
    fn owning_file_component_reads_the_middle_segment() {
        let id = Id::for_definition(NodeLabel::Function, "src/a.ts", "foo");
        assert_eq!(owning_file_component(&id), Some("src/a.ts"));
    }

    #[test]
    fn owning_file_component_is_none_for_derived_ids() {
        let member = Id::for_definition(NodeLabel::Function, "a.ts", "foo");
        let community = Id::for_derived(NodeLabel::Community, [&member]);
        assert_eq!(owning_file_component(&community), None);
    }

    #[test]
    fn owning_file_component_is_none_for_the_root_folder() {
        assert_eq!(owning_file_component(&Id::root_folder()), None);
    }

    #[test]
    fn build_folder_scaffold_creates_intermediate_folders() {
        let mut graph = Graph::new();
        build_folder_scaffold(&mut graph, &[("src/lib/a.ts".to_string(), b"x".to_vec())]);
        assert!(graph.contains_node(&NodeId::root_folder()));
        assert!(graph.contains_node(&NodeId::folder("src")));
        assert!(graph.contains_node(&NodeId::folder("src/lib")));
        assert!(graph.contains_node(&NodeId::file("src/lib/a.ts")));
    }
}
