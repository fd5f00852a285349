use crate::model::Graph;
use codegraph_core::{CodeGraphError, GraphStore, Node, NodeLabel, NodePayload, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

const COPY_OPTIONS: &str = "HEADER=true, ESCAPE='\"', DELIM=',', QUOTE='\"', PARALLEL=false, auto_detect=false";

/// Implements C9 (§4.9): stages CSVs under `<gitnexus>/csv/` and bulk-COPYs
/// them into the store, node tables before edge tables so a COPY failure
/// never leaves edges without the nodes they reference.
pub struct PersistReport {
    pub node_rows_written: usize,
    pub edge_rows_written: usize,
    pub fallback_row_count: usize,
    pub warnings: Vec<String>,
}

pub async fn persist_graph(graph: &Graph, store: &dyn GraphStore, gitnexus_dir: &Path) -> Result<PersistReport> {
    let csv_dir = gitnexus_dir.join("csv");
    std::fs::create_dir_all(&csv_dir).map_err(CodeGraphError::Io)?;

    let mut warnings = Vec::new();
    let node_rows_written = persist_nodes(graph, store, &csv_dir).await?;
    let (edge_rows_written, fallback) = persist_edges(graph, store, &csv_dir, &mut warnings).await?;

    for edge in &fallback {
        if let Err(e) = store.execute_query(&fallback_insert_cypher(edge)).await {
            warn!(from = %edge.from, to = %edge.to, error = %e, "fallback per-row insert failed, skipping");
        }
    }
    if !fallback.is_empty() {
        warnings.push(format!("{} edges fell back to per-row inserts", fallback.len()));
    }

    create_fts_indexes(store, &mut warnings).await;

    std::fs::remove_dir_all(&csv_dir).ok();

    Ok(PersistReport {
        node_rows_written,
        edge_rows_written,
        fallback_row_count: fallback.len(),
        warnings,
    })
}

async fn persist_nodes(graph: &Graph, store: &dyn GraphStore, csv_dir: &Path) -> Result<usize> {
    let mut folders = Vec::new();
    let mut files = Vec::new();
    let mut symbols = Vec::new();
    let mut communities = Vec::new();
    let mut processes = Vec::new();

    for node in graph.nodes() {
        match &node.payload {
            NodePayload::Folder(_) => folders.push(node),
            NodePayload::File(_) => files.push(node),
            NodePayload::Symbol(_) => symbols.push(node),
            NodePayload::Community(_) => communities.push(node),
            NodePayload::Process(_) => processes.push(node),
        }
    }

    let mut total = 0usize;
    total += copy_node_table(store, csv_dir, "Folder", "id,name,filePath", &folders, folder_row).await?;
    total += copy_node_table(store, csv_dir, "File", "id,name,filePath,content", &files, file_row).await?;
    total += copy_node_table(
        store,
        csv_dir,
        "Symbol(id,label,name,filePath,startLine,endLine,isExported,content)",
        "id,label,name,filePath,startLine,endLine,isExported,content",
        &symbols,
        symbol_row,
    )
    .await?;
    total += copy_node_table(store, csv_dir, "Community", "id,label,keywords,cohesion,symbolCount", &communities, community_row).await?;
    total += copy_node_table(store, csv_dir, "Process", "id,label,processType,stepCount,entryPointId,terminalId", &processes, process_row).await?;
    Ok(total)
}

async fn copy_node_table(
    store: &dyn GraphStore,
    csv_dir: &Path,
    table: &str,
    header: &str,
    nodes: &[&Node],
    row_fn: impl Fn(&Node) -> String,
) -> Result<usize> {
    if nodes.is_empty() {
        return Ok(0);
    }
    let file_name = table.split('(').next().unwrap_or(table);
    let csv_path = csv_dir.join(format!("{file_name}.csv"));
    let mut body = String::new();
    body.push_str(header);
    body.push('\n');
    for node in nodes {
        body.push_str(&row_fn(node));
        body.push('\n');
    }
    std::fs::write(&csv_path, body).map_err(CodeGraphError::Io)?;

    store.copy_csv(table, &csv_path, COPY_OPTIONS).await.map_err(|e| {
        CodeGraphError::Fatal(format!("required node table {file_name} failed to load: {e}"))
    })?;
    info!(table = file_name, rows = nodes.len(), "copied node table");
    Ok(nodes.len())
}

async fn persist_edges(
    graph: &Graph,
    store: &dyn GraphStore,
    csv_dir: &Path,
    warnings: &mut Vec<String>,
) -> Result<(usize, Vec<FallbackEdge>)> {
    let mut by_kind: HashMap<&'static str, Vec<FallbackEdge>> = HashMap::new();
    for edge in graph.edges() {
        let table = edge.kind.as_str();
        by_kind.entry(table).or_default().push(FallbackEdge {
            table,
            from: edge.from.as_str().to_string(),
            to: edge.to.as_str().to_string(),
            confidence: edge.confidence.value(),
            reason: edge.reason.clone(),
            step: edge.step,
        });
    }

    let mut total = 0usize;
    let mut fallback = Vec::new();

    for (table, rows) in by_kind {
        let csv_path = csv_dir.join(format!("{table}.csv"));
        let has_step = table == "STEP_IN_PROCESS";
        let header = if has_step { "from,to,confidence,reason,step" } else { "from,to,confidence,reason" };
        let mut body = String::new();
        body.push_str(header);
        body.push('\n');
        for row in &rows {
            body.push_str(&edge_row(row, has_step));
            body.push('\n');
        }
        if std::fs::write(&csv_path, body).is_err() {
            fallback.extend(rows);
            continue;
        }

        match store.copy_csv(table, &csv_path, COPY_OPTIONS).await {
            Ok(()) => total += rows.len(),
            Err(e) => {
                warnings.push(format!("COPY for edge table {table} failed, falling back to per-row inserts: {e}"));
                fallback.extend(rows);
            }
        }
    }

    Ok((total, fallback))
}

struct FallbackEdge {
    table: &'static str,
    from: String,
    to: String,
    confidence: f32,
    reason: String,
    step: Option<u32>,
}

fn edge_row(edge: &FallbackEdge, has_step: bool) -> String {
    if has_step {
        format!(
            "{},{},{},{},{}",
            csv_field(&edge.from),
            csv_field(&edge.to),
            edge.confidence,
            csv_field(&edge.reason),
            edge.step.unwrap_or(0)
        )
    } else {
        format!("{},{},{},{}", csv_field(&edge.from), csv_field(&edge.to), edge.confidence, csv_field(&edge.reason))
    }
}

fn fallback_insert_cypher(edge: &FallbackEdge) -> String {
    let step_clause = edge.step.map(|s| format!(", step: {s}")).unwrap_or_default();
    format!(
        "MATCH (a {{id: '{}'}}), (b {{id: '{}'}}) CREATE (a)-[:{} {{confidence: {}, reason: '{}'{}}}]->(b)",
        escape_literal(&edge.from),
        escape_literal(&edge.to),
        edge.table,
        edge.confidence,
        escape_literal(&edge.reason),
        step_clause
    )
}

async fn create_fts_indexes(store: &dyn GraphStore, warnings: &mut Vec<String>) {
    let targets: &[NodeLabel] = &[NodeLabel::File, NodeLabel::Function, NodeLabel::Class, NodeLabel::Method, NodeLabel::Interface];
    for label in targets {
        let table = if *label == NodeLabel::File { "File" } else { "Symbol" };
        let index_name = format!("{}_fts", label.as_str().to_lowercase());
        if let Err(e) = store.create_fts_index(table, &index_name, &["name", "content"], "porter").await {
            warnings.push(format!("full-text index {index_name} failed: {e}"));
        }
    }
}

fn folder_row(node: &Node) -> String {
    let NodePayload::Folder(a) = &node.payload else { return String::new() };
    format!("{},{},{}", csv_field(node.id.as_str()), csv_field(&a.name), csv_field(&a.file_path))
}

fn file_row(node: &Node) -> String {
    let NodePayload::File(a) = &node.payload else { return String::new() };
    format!(
        "{},{},{},{}",
        csv_field(node.id.as_str()),
        csv_field(&a.name),
        csv_field(&a.file_path),
        csv_field(&a.content)
    )
}

fn symbol_row(node: &Node) -> String {
    let NodePayload::Symbol(a) = &node.payload else { return String::new() };
    format!(
        "{},{},{},{},{},{},{},{}",
        csv_field(node.id.as_str()),
        csv_field(node.label.as_str()),
        csv_field(&a.name),
        csv_field(&a.file_path),
        a.span.start_line,
        a.span.end_line,
        a.is_exported.map(|b| b.to_string()).unwrap_or_default(),
        csv_field(&a.content)
    )
}

fn community_row(node: &Node) -> String {
    let NodePayload::Community(a) = &node.payload else { return String::new() };
    format!(
        "{},{},{},{},{}",
        csv_field(node.id.as_str()),
        csv_field(&a.label),
        csv_field(&a.keywords.join("|")),
        a.cohesion,
        a.symbol_count
    )
}

fn process_row(node: &Node) -> String {
    let NodePayload::Process(a) = &node.payload else { return String::new() };
    format!(
        "{},{},{},{},{},{}",
        csv_field(node.id.as_str()),
        csv_field(&a.label),
        csv_field(&a.process_type),
        a.step_count,
        csv_field(a.entry_point_id.as_str()),
        csv_field(a.terminal_id.as_str())
    )
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_escapes_embedded_quotes() {
        assert_eq!(csv_field("he said \"hi\""), "\"he said \"\"hi\"\"\"");
    }

    #[test]
    fn escape_literal_escapes_single_quotes() {
        assert_eq!(escape_literal("O'Brien"), "O\\'Brien");
    }
}
