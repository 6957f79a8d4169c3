pub mod embedding;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use rusqlite::{Connection, ErrorCode, params};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::intent::Intent;
use embedding::TextEmbedder;
use types::{CommandRecord, HistoryEntry};

/// Semantic command cache: SQLite metadata plus a sqlite-vec index over
/// command descriptions, queried by meaning rather than exact text.
pub struct CommandStore {
    db: Arc<Mutex<Connection>>,
    embedder: Arc<dyn TextEmbedder>,
}

// Load sqlite-vec globally for rusqlite, once per process.
fn load_vec_extension() {
    use rusqlite::ffi::sqlite3_auto_extension;
    static LOAD: std::sync::Once = std::sync::Once::new();
    LOAD.call_once(|| unsafe {
        sqlite3_auto_extension(Some(std::mem::transmute::<
            *const (),
            unsafe extern "C" fn(
                *mut rusqlite::ffi::sqlite3,
                *mut *mut std::os::raw::c_char,
                *const rusqlite::ffi::sqlite3_api_routines,
            ) -> std::os::raw::c_int,
        >(sqlite_vec::sqlite3_vec_init as *const ())));
    });
}

fn vector_blob(v: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(v.len() * 4);
    for x in v {
        blob.extend_from_slice(&x.to_le_bytes());
    }
    blob
}

impl CommandStore {
    pub async fn open(db_path: &Path, embedder: Arc<dyn TextEmbedder>) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.exists()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        load_vec_extension();

        let db = Connection::open(db_path)?;
        Self::init_schema(&db, embedder.dimension())?;
        info!("command store initialized at {:?}", db_path);

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            embedder,
        })
    }

    fn init_schema(db: &Connection, dim: usize) -> Result<()> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS commands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL,
                file_path TEXT NOT NULL,
                usage_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                last_used TEXT
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS command_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL,
                intent TEXT NOT NULL,
                command_name TEXT,
                executed INTEGER NOT NULL,
                timestamp TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        db.execute(
            &format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS vss_commands USING vec0(
                    embedding float[{}] distance_metric=cosine
                )",
                dim
            ),
            [],
        )?;

        Ok(())
    }

    /// Register a new command and index its description for similarity
    /// search. Returns `Ok(false)` without touching existing state when the
    /// name is already taken; that is a non-fatal condition for callers.
    pub async fn add(&self, name: &str, description: &str, file_path: &Path) -> Result<bool> {
        let vector = self.embedder.embed(description).await?;

        let mut db = self.db.lock().await;
        let tx = db.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO commands (name, description, file_path) VALUES (?1, ?2, ?3)",
            params![name, description, file_path.to_string_lossy()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                warn!("command already exists: {}", name);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        let rowid = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO vss_commands (rowid, embedding) VALUES (?1, ?2)",
            params![rowid, vector_blob(&vector)],
        )?;
        tx.commit()?;

        info!("added command: {}", name);
        Ok(true)
    }

    /// Nearest-neighbor lookup for an intent. Returns the single closest
    /// record only if its cosine distance is below `1 - threshold`. An empty
    /// index, an embedding failure, or nothing clearing the threshold all
    /// return `Ok(None)` — the expected miss path, not an error.
    pub async fn find(&self, intent: &Intent, threshold: f32) -> Result<Option<CommandRecord>> {
        let query = intent.search_text();
        let vector = match self.embedder.embed(&query).await {
            Ok(v) => v,
            Err(e) => {
                warn!("search embedding failed: {}", e);
                return Ok(None);
            }
        };

        let db = self.db.lock().await;
        let nearest = db.query_row(
            "SELECT rowid, distance FROM vss_commands
             WHERE embedding MATCH ?1 ORDER BY distance LIMIT 1",
            params![vector_blob(&vector)],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)),
        );

        let (rowid, distance) = match nearest {
            Ok(hit) => hit,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => {
                warn!("similarity search failed: {}", e);
                return Ok(None);
            }
        };

        if distance >= f64::from(1.0 - threshold) {
            return Ok(None);
        }

        let record = db
            .query_row(
                "SELECT name, description, file_path, usage_count, created_at, last_used
                 FROM commands WHERE id = ?1",
                params![rowid],
                row_to_record,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(record)
    }

    /// Bump the usage counter and last-used timestamp in one atomic UPDATE.
    /// A missing name is logged, never raised.
    pub async fn record_used(&self, name: &str) -> Result<()> {
        let db = self.db.lock().await;
        let updated = db.execute(
            "UPDATE commands
             SET usage_count = usage_count + 1, last_used = datetime('now')
             WHERE name = ?1",
            params![name],
        )?;
        if updated == 0 {
            warn!("record_used: no such command: {}", name);
        }
        Ok(())
    }

    /// All commands ordered by usage count descending; ties break on insert
    /// order so the listing is deterministic.
    pub async fn list_all(&self) -> Result<Vec<CommandRecord>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT name, description, file_path, usage_count, created_at, last_used
             FROM commands ORDER BY usage_count DESC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Best-effort append to the resolution log; a write failure is logged
    /// and never propagated to the caller.
    pub async fn append_history(
        &self,
        query: &str,
        intent: &Intent,
        command_name: Option<&str>,
        executed: bool,
    ) {
        let intent_json = intent.search_text();
        let db = self.db.lock().await;
        let result = db.execute(
            "INSERT INTO command_history (query, intent, command_name, executed)
             VALUES (?1, ?2, ?3, ?4)",
            params![query, intent_json, command_name, executed],
        );
        if let Err(e) = result {
            warn!("history append failed: {}", e);
        }
    }

    /// Most recent history entries, newest first.
    pub async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT query, intent, command_name, executed, timestamp
             FROM command_history ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(HistoryEntry {
                query: row.get(0)?,
                intent: serde_json::from_str(&row.get::<_, String>(1)?)
                    .unwrap_or(serde_json::Value::Null),
                command_name: row.get(2)?,
                executed: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommandRecord> {
    Ok(CommandRecord {
        name: row.get(0)?,
        description: row.get(1)?,
        file_path: row.get(2)?,
        usage_count: row.get(3)?,
        created_at: row.get(4)?,
        last_used: row.get(5)?,
    })
}

/// Create a CommandStore in a temp directory with caller-pinned embedding
/// vectors. Avoids network and filesystem side effects outside the temp dir.
#[cfg(test)]
pub(crate) async fn test_command_store(
    vectors: &[(&str, Vec<f32>)],
    dim: usize,
) -> (CommandStore, tempfile::TempDir) {
    use embedding::MappedEmbedder;
    use std::collections::HashMap;

    let map: HashMap<String, Vec<f32>> = vectors
        .iter()
        .map(|(text, v)| (text.to_string(), v.clone()))
        .collect();
    let tmp = tempfile::tempdir().expect("create temp dir");
    let store = CommandStore::open(
        &tmp.path().join("commands.db"),
        Arc::new(MappedEmbedder { map, dim }),
    )
    .await
    .expect("open test store");
    (store, tmp)
}
