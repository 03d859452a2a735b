//! Content repository: CRUD over content, tags and their links

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use super::{content_from_row, format_timestamp, Database, CONTENT_COLUMNS};
use crate::core::model::{normalize_tags, Content, ContentDraft, ContentType, Tag, TagUsage, DEFAULT_LIMIT};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ContentRepository {
    db: Database,
}

impl ContentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert content and link its tags in one transaction
    pub fn create(&self, draft: &ContentDraft) -> Result<i64> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;
        let now = format_timestamp(&Utc::now());

        tx.execute(
            r#"
            INSERT INTO content (type, title, body, source_url, file_path, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                draft.content_type,
                draft.title,
                draft.body,
                draft.source_url,
                draft.file_path,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();

        link_tags(&tx, id, &draft.tags)?;
        tx.commit()?;

        debug!(content_id = id, "created content");
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<Content> {
        let conn = self.db.connect()?;
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM content c WHERE c.id = ?1");

        let mut content = conn
            .query_row(&sql, params![id], content_from_row)
            .optional()?
            .ok_or_else(|| Error::content_not_found(id))?;
        content.tags = load_tags(&conn, id)?;
        Ok(content)
    }

    /// Newest first, optionally restricted to one type
    pub fn list(&self, content_type: Option<ContentType>, limit: i64, offset: i64) -> Result<Vec<Content>> {
        let conn = self.db.connect()?;
        let limit = effective_limit(limit) as i64;
        let offset = offset.max(0);

        let mut sql = format!("SELECT {CONTENT_COLUMNS} FROM content c");
        if content_type.is_some() {
            sql.push_str(" WHERE c.type = ?3");
        }
        sql.push_str(" ORDER BY c.created_at DESC, c.id DESC LIMIT ?1 OFFSET ?2");

        let mut stmt = conn.prepare(&sql)?;
        let rows = match content_type {
            Some(t) => stmt.query_map(params![limit, offset, t], content_from_row)?,
            None => stmt.query_map(params![limit, offset], content_from_row)?,
        };

        let mut contents = Vec::new();
        for row in rows {
            let mut content = row?;
            content.tags = load_tags(&conn, content.id)?;
            contents.push(content);
        }
        Ok(contents)
    }

    /// Replace every mutable field and the whole tag set. Returns false when
    /// no row has this id; nothing is written in that case.
    pub fn update(&self, id: i64, draft: &ContentDraft) -> Result<bool> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            r#"
            UPDATE content
            SET type = ?1, title = ?2, body = ?3, source_url = ?4, file_path = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
            params![
                draft.content_type,
                draft.title,
                draft.body,
                draft.source_url,
                draft.file_path,
                format_timestamp(&Utc::now()),
                id,
            ],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        tx.execute("DELETE FROM content_tags WHERE content_id = ?1", params![id])?;
        link_tags(&tx, id, &draft.tags)?;
        tx.commit()?;

        debug!(content_id = id, "updated content");
        Ok(true)
    }

    /// Links and embeddings go with the row (ON DELETE CASCADE)
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.db.connect()?;
        let deleted = conn.execute("DELETE FROM content WHERE id = ?1", params![id])?;
        debug!(content_id = id, deleted, "deleted content");
        Ok(deleted > 0)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Idempotent: an existing name resolves to the existing tag
    pub fn create_tag(&self, name: &str) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("tag name must not be empty".to_string()));
        }

        let conn = self.db.connect()?;
        let id = ensure_tag(&conn, name)?;
        Ok(Tag {
            id,
            name: name.to_string(),
        })
    }

    /// Every tag with the number of content records carrying it, most used
    /// first
    pub fn tag_usage(&self) -> Result<Vec<TagUsage>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.name, COUNT(ct.content_id) AS uses
            FROM tags t
            LEFT JOIN content_tags ct ON ct.tag_id = t.id
            GROUP BY t.id
            ORDER BY uses DESC, t.name
            "#,
        )?;
        let usage = stmt
            .query_map([], |row| {
                let count: i64 = row.get(2)?;
                Ok(TagUsage {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    count: count as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(usage)
    }
}

/// Clamp a caller-supplied limit: unset or non-positive means the default
pub fn effective_limit(limit: i64) -> usize {
    if limit > 0 {
        limit as usize
    } else {
        DEFAULT_LIMIT
    }
}

/// Tag names of one content record, sorted
pub(crate) fn load_tags(conn: &Connection, content_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT t.name
        FROM tags t
        JOIN content_tags ct ON t.id = ct.tag_id
        WHERE ct.content_id = ?1
        ORDER BY t.name
        "#,
    )?;
    let tags = stmt
        .query_map(params![content_id], |row| row.get(0))?
        .collect();
    tags
}

fn ensure_tag(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])?;
    conn.query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
}

fn link_tags(tx: &Transaction<'_>, content_id: i64, tags: &[String]) -> rusqlite::Result<()> {
    for name in normalize_tags(tags) {
        let tag_id = ensure_tag(tx, &name)?;
        tx.execute(
            "INSERT INTO content_tags (content_id, tag_id) VALUES (?1, ?2)",
            params![content_id, tag_id],
        )?;
    }
    Ok(())
}
