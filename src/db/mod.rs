//! SQLite storage for content, tags and embeddings
//!
//! Each operation opens its own connection and runs inside SQLite's own
//! transactions; the file is the only shared mutable state. Embeddings are
//! stored as BLOBs and compared in Rust.

pub mod content;
pub mod embeddings;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Row};
use tracing::{debug, info};

use crate::core::model::Content;
use crate::core::text::fold_str;
use crate::error::Result;

pub use content::ContentRepository;
pub use embeddings::EmbeddingStore;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS content (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT NOT NULL CHECK (type IN ('note', 'snippet', 'bookmark', 'document')),
        title TEXT NOT NULL,
        body TEXT NOT NULL DEFAULT '',
        source_url TEXT,
        file_path TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS content_tags (
        content_id INTEGER NOT NULL REFERENCES content(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (content_id, tag_id)
    );

    CREATE TABLE IF NOT EXISTS embeddings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content_id INTEGER NOT NULL REFERENCES content(id) ON DELETE CASCADE,
        embedding BLOB NOT NULL,
        model TEXT NOT NULL,
        dimensions INTEGER NOT NULL,
        UNIQUE (content_id, model)
    );

    CREATE INDEX IF NOT EXISTS idx_content_type ON content(type);
    CREATE INDEX IF NOT EXISTS idx_content_created ON content(created_at);
    CREATE INDEX IF NOT EXISTS idx_content_tags_tag ON content_tags(tag_id);
    CREATE INDEX IF NOT EXISTS idx_embeddings_model ON embeddings(model);
"#;

/// Column list matching [`content_from_row`]
pub(crate) const CONTENT_COLUMNS: &str =
    "c.id, c.type, c.title, c.body, c.source_url, c.file_path, c.created_at, c.updated_at";

/// Handle to the knowledge base file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

/// Row counts reported by `pkb status`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub content_count: usize,
    pub tag_count: usize,
    pub embedding_count: usize,
}

impl Database {
    /// Open or create the database at path and apply the schema
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Self {
            path: path.to_path_buf(),
        };

        let conn = db.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %path.display(), journal_mode = %mode, "database initialized");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// New connection with foreign keys enforced and the helper SQL functions
    /// registered
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        register_functions(&conn)?;
        debug!(path = %self.path.display(), "opened connection");
        Ok(conn)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.connect()?;
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            content_count: count("SELECT COUNT(*) FROM content")?,
            tag_count: count("SELECT COUNT(*) FROM tags")?,
            embedding_count: count("SELECT COUNT(*) FROM embeddings")?,
        })
    }
}

/// `contains_ci(haystack, needle)`: case-insensitive substring test using the
/// same folding as snippet extraction. Unlike LIKE, `%` and `_` in the needle
/// match literally.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "contains_ci",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: String = ctx.get(0)?;
            let needle: String = ctx.get(1)?;
            Ok(fold_str(&haystack).contains(&fold_str(&needle)))
        },
    )
}

/// Fixed-width UTC timestamp so that text order equals time order
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Map a row selected with [`CONTENT_COLUMNS`]; tags are loaded separately
pub(crate) fn content_from_row(row: &Row<'_>) -> rusqlite::Result<Content> {
    Ok(Content {
        id: row.get(0)?,
        content_type: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        source_url: row.get(4)?,
        file_path: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
        updated_at: parse_timestamp(row, 7)?,
        tags: Vec::new(),
    })
}
