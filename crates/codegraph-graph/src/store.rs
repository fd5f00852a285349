use async_trait::async_trait;
use codegraph_core::{CodeGraphError, GraphStore, Result};
use kuzu::{Connection, Database, SystemConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// DDL executed on `init`, in order. Each statement is idempotent: Kuzu's
/// "already exists" error on a repeated `CREATE NODE TABLE` is absorbed
/// rather than propagated, so re-opening an existing database file is safe
/// (§4.9 step 1).
const NODE_TABLE_DDL: &[&str] = &[
    "CREATE NODE TABLE IF NOT EXISTS Folder(id STRING, name STRING, filePath STRING, PRIMARY KEY(id))",
    "CREATE NODE TABLE IF NOT EXISTS File(id STRING, name STRING, filePath STRING, content STRING, PRIMARY KEY(id))",
    "CREATE NODE TABLE IF NOT EXISTS Symbol(id STRING, label STRING, name STRING, filePath STRING, startLine INT64, endLine INT64, isExported BOOLEAN, content STRING, embedding FLOAT[384], PRIMARY KEY(id))",
    "CREATE NODE TABLE IF NOT EXISTS Community(id STRING, label STRING, keywords STRING, cohesion DOUBLE, symbolCount INT64, PRIMARY KEY(id))",
    "CREATE NODE TABLE IF NOT EXISTS Process(id STRING, label STRING, processType STRING, stepCount INT64, entryPointId STRING, terminalId STRING, PRIMARY KEY(id))",
];

const EDGE_TABLE_DDL: &[&str] = &[
    "CREATE REL TABLE IF NOT EXISTS CONTAINS(FROM Folder TO Folder, FROM Folder TO File, confidence DOUBLE, reason STRING)",
    "CREATE REL TABLE IF NOT EXISTS DEFINES(FROM File TO Symbol, confidence DOUBLE, reason STRING)",
    "CREATE REL TABLE IF NOT EXISTS IMPORTS(FROM File TO File, confidence DOUBLE, reason STRING)",
    "CREATE REL TABLE IF NOT EXISTS CALLS(FROM Symbol TO Symbol, FROM File TO Symbol, confidence DOUBLE, reason STRING)",
    "CREATE REL TABLE IF NOT EXISTS EXTENDS(FROM Symbol TO Symbol, confidence DOUBLE, reason STRING)",
    "CREATE REL TABLE IF NOT EXISTS IMPLEMENTS(FROM Symbol TO Symbol, confidence DOUBLE, reason STRING)",
    "CREATE REL TABLE IF NOT EXISTS MEMBER_OF(FROM Symbol TO Community, confidence DOUBLE, reason STRING)",
    "CREATE REL TABLE IF NOT EXISTS STEP_IN_PROCESS(FROM Symbol TO Process, confidence DOUBLE, reason STRING, step INT64)",
];

/// `GraphStore` backed by the embedded Kuzu database (§6). `Database` and
/// `Connection` are self-referential in the upstream crate (`Connection<'a>`
/// borrows `&'a Database`); we leak the boxed `Database` for the process
/// lifetime of an open store and reclaim it explicitly in `close`, which is
/// the only place the connection is guaranteed dropped first.
pub struct KuzuGraphStore {
    db: Option<&'static Database>,
    conn: Option<Connection<'static>>,
}

impl Default for KuzuGraphStore {
    fn default() -> Self {
        KuzuGraphStore { db: None, conn: None }
    }
}

impl KuzuGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&self) -> Result<&Connection<'static>> {
        self.conn.as_ref().ok_or_else(|| CodeGraphError::Store("store not initialized".into()))
    }

    fn run_ddl(conn: &Connection<'static>) -> Result<()> {
        for stmt in NODE_TABLE_DDL.iter().chain(EDGE_TABLE_DDL.iter()) {
            conn.query(stmt).map_err(|e| CodeGraphError::Store(format!("DDL failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for KuzuGraphStore {
    async fn init(&mut self, path: &Path) -> Result<()> {
        if path.exists() {
            debug!(path = %path.display(), "removing stale database before reopen");
            if path.is_dir() {
                std::fs::remove_dir_all(path).map_err(CodeGraphError::Io)?;
            } else {
                std::fs::remove_file(path).map_err(CodeGraphError::Io)?;
            }
        }

        let database = Database::new(path, SystemConfig::default())
            .map_err(|e| CodeGraphError::Store(format!("failed to open kuzu database at {}: {e}", path.display())))?;
        let database: &'static Database = Box::leak(Box::new(database));
        let conn = Connection::new(database)
            .map_err(|e| CodeGraphError::Store(format!("failed to open kuzu connection: {e}")))?;

        Self::run_ddl(&conn)?;

        self.db = Some(database);
        self.conn = Some(conn);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.conn = None;
        if let Some(db) = self.db.take() {
            // SAFETY: `conn` above was the only live borrow of `db` and has
            // just been dropped, so reclaiming the box is sound.
            unsafe {
                drop(Box::from_raw(db as *const Database as *mut Database));
            }
        }
        Ok(())
    }

    async fn execute_query(&self, cypher: &str) -> Result<Vec<serde_json::Value>> {
        let conn = self.connection()?;
        let mut result = conn
            .query(cypher)
            .map_err(|e| CodeGraphError::Store(format!("query failed: {e}")))?;
        let rows = result
            .iter()
            .map(|row| serde_json::Value::String(format!("{row:?}")))
            .collect();
        Ok(rows)
    }

    async fn copy_csv(&self, table: &str, csv_path: &Path, options: &str) -> Result<()> {
        let conn = self.connection()?;
        let primary = format!("COPY {table} FROM '{}' ({options})", csv_path.display());
        if let Err(first_error) = conn.query(&primary) {
            warn!(table, error = %first_error, "bulk COPY failed, retrying with IGNORE_ERRORS");
            let fallback_options = if options.contains("IGNORE_ERRORS") {
                options.to_string()
            } else {
                format!("{options}, IGNORE_ERRORS=true")
            };
            let retry = format!("COPY {table} FROM '{}' ({fallback_options})", csv_path.display());
            conn.query(&retry)
                .map_err(|e| CodeGraphError::Fatal(format!("COPY into {table} failed after retry: {e}")))?;
        }
        Ok(())
    }

    async fn create_vector_index(&self, table: &str, index_name: &str, column: &str, metric: &str) -> Result<()> {
        let conn = self.connection()?;
        let stmt = format!("CALL CREATE_VECTOR_INDEX('{table}', '{index_name}', '{column}', metric := '{metric}')");
        conn.query(&stmt)
            .map_err(|e| CodeGraphError::Store(format!("vector index creation on {table} failed: {e}")))?;
        Ok(())
    }

    async fn create_fts_index(&self, table: &str, index_name: &str, columns: &[&str], stemmer: &str) -> Result<()> {
        let conn = self.connection()?;
        let column_list = columns.iter().map(|c| format!("'{c}'")).collect::<Vec<_>>().join(", ");
        let stmt = format!("CALL CREATE_FTS_INDEX('{table}', '{index_name}', [{column_list}], stemmer := '{stemmer}')");
        // Best-effort per §4.9: FTS failures degrade search gracefully and
        // never abort the run.
        if let Err(e) = conn.query(&stmt) {
            warn!(table, index_name, error = %e, "full-text index creation failed, continuing without it");
        }
        Ok(())
    }
}

/// Resolves the Kuzu database file path for a repository's `.gitnexus`
/// directory (§6).
pub fn database_path(gitnexus_dir: &Path) -> PathBuf {
    gitnexus_dir.join("kuzu")
}

unsafe impl Send for KuzuGraphStore {}
unsafe impl Sync for KuzuGraphStore {}
