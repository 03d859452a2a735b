//! Embedding store: one vector per (content, model)
//!
//! Vectors are stored as little-endian f32 BLOBs. The dimensions column is
//! checked against the BLOB length on every read.

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::content::load_tags;
use super::{content_from_row, Database, CONTENT_COLUMNS};
use crate::core::model::{Content, ContentType};
use crate::error::{Error, Result};

const F32_BYTES: usize = std::mem::size_of::<f32>();

#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    db: Database,
}

impl EmbeddingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Overwrite the row for (content, model) in place, or insert one.
    ///
    /// The lookup and the write share an IMMEDIATE transaction, so two
    /// concurrent upserts for the same key serialize on SQLite's write lock.
    pub fn upsert(&self, content_id: i64, vector: &[u8], model: &str, dimensions: usize) -> Result<i64> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM embeddings WHERE content_id = ?1 AND model = ?2",
                params![content_id, model],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE embeddings SET embedding = ?1, dimensions = ?2 WHERE id = ?3",
                    params![vector, dimensions as i64, id],
                )?;
                id
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO embeddings (content_id, embedding, model, dimensions)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![content_id, vector, model, dimensions as i64],
                )?;
                tx.last_insert_rowid()
            }
        };
        tx.commit()?;

        debug!(content_id, model, dimensions, embedding_id = id, "stored embedding");
        Ok(id)
    }

    /// Raw vector bytes for (content, model)
    pub fn get(&self, content_id: i64, model: &str) -> Result<Vec<u8>> {
        let conn = self.db.connect()?;
        conn.query_row(
            "SELECT embedding FROM embeddings WHERE content_id = ?1 AND model = ?2",
            params![content_id, model],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| Error::NotFound {
            kind: "embedding",
            id: format!("{content_id}/{model}"),
        })
    }

    pub fn store_vector(&self, content_id: i64, vector: &[f32], model: &str) -> Result<i64> {
        self.upsert(content_id, &encode_vector(vector), model, vector.len())
    }

    pub fn load_vector(&self, content_id: i64, model: &str) -> Result<Vec<f32>> {
        let conn = self.db.connect()?;
        let row: Option<(Vec<u8>, i64)> = conn
            .query_row(
                "SELECT embedding, dimensions FROM embeddings WHERE content_id = ?1 AND model = ?2",
                params![content_id, model],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (blob, dimensions) = row.ok_or_else(|| Error::NotFound {
            kind: "embedding",
            id: format!("{content_id}/{model}"),
        })?;
        decode_vector(content_id, &blob, dimensions as usize)
    }

    /// Number of stored vectors for one content record, across models
    pub fn count_for(&self, content_id: i64) -> Result<usize> {
        let conn = self.db.connect()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE content_id = ?1",
            params![content_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Every content record with a vector for `model`, with tags attached, in
    /// retrieval order. This is the full scan semantic search ranks.
    pub fn candidates(&self, model: &str, content_type: Option<ContentType>) -> Result<Vec<(Content, Vec<f32>)>> {
        let conn = self.db.connect()?;

        let mut sql = format!(
            r#"
            SELECT {CONTENT_COLUMNS}, e.embedding, e.dimensions
            FROM content c
            JOIN embeddings e ON c.id = e.content_id
            WHERE e.model = ?1
            "#
        );
        if content_type.is_some() {
            sql.push_str(" AND c.type = ?2");
        }
        sql.push_str(" ORDER BY c.id");

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(Content, Vec<u8>, i64)> {
            Ok((content_from_row(row)?, row.get(8)?, row.get(9)?))
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = match content_type {
            Some(t) => stmt.query_map(params![model, t], map_row)?,
            None => stmt.query_map(params![model], map_row)?,
        };

        let mut candidates = Vec::new();
        for row in rows {
            let (mut content, blob, dimensions) = row?;
            let vector = decode_vector(content.id, &blob, dimensions as usize)?;
            content.tags = load_tags(&conn, content.id)?;
            candidates.push((content, vector));
        }

        debug!(model, count = candidates.len(), "loaded embedding candidates");
        Ok(candidates)
    }
}

/// Convert f32 embedding to BLOB
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * F32_BYTES);
    for &val in vector {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert BLOB to f32 embedding, checking it against the recorded length
pub fn decode_vector(content_id: i64, blob: &[u8], dimensions: usize) -> Result<Vec<f32>> {
    if blob.len() != dimensions * F32_BYTES {
        return Err(Error::CorruptEmbedding {
            content_id,
            reason: format!(
                "{} bytes stored for {} dimensions",
                blob.len(),
                dimensions
            ),
        });
    }

    Ok(blob
        .chunks_exact(F32_BYTES)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
