//! Search Engine - keyword search in SQL, semantic search over stored vectors

use std::sync::Arc;
use std::time::{Duration, Instant};

use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::{debug, info};

use super::rank::{cosine_similarity, has_all_tags, paginate, sort_by_score};
use super::snippet::extract_snippet;
use crate::core::model::{normalize_tags, SearchQuery, SearchResult};
use crate::db::content::{effective_limit, load_tags};
use crate::db::{content_from_row, Database, EmbeddingStore, CONTENT_COLUMNS};
use crate::error::{Error, Result};
use crate::generator::{with_deadline, EmbeddingGenerator};

/// Answers search queries against the current state of the store
#[derive(Clone)]
pub struct SearchEngine {
    db: Database,
    embeddings: EmbeddingStore,
    embedder: Arc<dyn EmbeddingGenerator>,
    deadline: Duration,
}

impl SearchEngine {
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingGenerator>, deadline: Duration) -> Self {
        Self {
            embeddings: EmbeddingStore::new(db.clone()),
            db,
            embedder,
            deadline,
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        if query.query.trim().is_empty() {
            return Err(Error::Validation("search query must not be empty".to_string()));
        }

        let start = Instant::now();
        let results = if query.semantic {
            self.semantic_search(query).await?
        } else {
            self.keyword_search(query)?
        };

        info!(
            semantic = query.semantic,
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );
        Ok(results)
    }

    /// Case-insensitive substring match on title or body, newest first
    pub fn keyword_search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let conn = self.db.connect()?;

        let mut sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM content c WHERE (contains_ci(c.title, ?) OR contains_ci(c.body, ?))"
        );
        let mut args = vec![
            Value::Text(query.query.clone()),
            Value::Text(query.query.clone()),
        ];

        if let Some(content_type) = query.content_type {
            sql.push_str(" AND c.type = ?");
            args.push(Value::Text(content_type.as_str().to_string()));
        }

        let required = normalize_tags(&query.tags);
        if !required.is_empty() {
            let placeholders = vec!["?"; required.len()].join(", ");
            sql.push_str(&format!(
                r#"
                AND c.id IN (
                    SELECT ct.content_id
                    FROM content_tags ct
                    JOIN tags t ON ct.tag_id = t.id
                    WHERE t.name IN ({placeholders})
                    GROUP BY ct.content_id
                    HAVING COUNT(DISTINCT t.name) = ?
                )"#
            ));
            args.extend(required.iter().cloned().map(Value::Text));
            args.push(Value::Integer(required.len() as i64));
        }

        sql.push_str(" ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?");
        args.push(Value::Integer(effective_limit(query.limit) as i64));
        args.push(Value::Integer(query.offset.max(0)));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), content_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            let mut content = row?;
            content.tags = load_tags(&conn, content.id)?;
            let snippet = extract_snippet(&content.body, &query.query);
            results.push(SearchResult {
                content,
                score: None,
                snippet,
            });
        }

        debug!(query = %query.query, result_count = results.len(), "keyword search");
        Ok(results)
    }

    /// Brute-force cosine ranking over every stored vector for the active
    /// model. A failed query embedding fails the search.
    pub async fn semantic_search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let query_embedding = with_deadline(self.deadline, self.embedder.generate(&query.query)).await?;

        let candidates = self
            .embeddings
            .candidates(self.embedder.model_name(), query.content_type)?;
        let scanned = candidates.len();

        let required = normalize_tags(&query.tags);
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|(content, _)| has_all_tags(&content.tags, &required))
            .map(|(content, vector)| SearchResult {
                score: Some(cosine_similarity(&query_embedding, &vector)),
                content,
                snippet: String::new(),
            })
            .collect();

        sort_by_score(&mut results);
        let mut page = paginate(results, query.limit, query.offset);
        for result in &mut page {
            result.snippet = extract_snippet(&result.content.body, &query.query);
        }

        debug!(
            query = %query.query,
            model = self.embedder.model_name(),
            scanned,
            result_count = page.len(),
            "semantic search"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ContentDraft, ContentType};
    use crate::db::ContentRepository;
    use crate::generator::GeneratorError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Maps a handful of words onto fixed axes
    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingGenerator for AxisEmbedder {
        async fn generate(&self, text: &str) -> std::result::Result<Vec<f32>, GeneratorError> {
            let text = text.to_lowercase();
            Ok(["cat", "dog", "car"]
                .iter()
                .map(|w| if text.contains(w) { 1.0 } else { 0.0 })
                .collect())
        }

        fn model_name(&self) -> &str {
            "axis"
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingGenerator for DownEmbedder {
        async fn generate(&self, _text: &str) -> std::result::Result<Vec<f32>, GeneratorError> {
            Err(GeneratorError::Unavailable("offline".to_string()))
        }

        fn model_name(&self) -> &str {
            "axis"
        }
    }

    fn setup(embedder: Arc<dyn EmbeddingGenerator>) -> (TempDir, ContentRepository, EmbeddingStore, SearchEngine) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("kb.db")).unwrap();
        let engine = SearchEngine::new(db.clone(), embedder, Duration::from_secs(5));
        (
            dir,
            ContentRepository::new(db.clone()),
            EmbeddingStore::new(db),
            engine,
        )
    }

    #[tokio::test]
    async fn test_keyword_search_case_insensitive() -> Result<()> {
        let (_dir, repo, _store, engine) = setup(Arc::new(AxisEmbedder));
        let id = repo.create(&ContentDraft::new(ContentType::Note, "Pets", "My Cat sleeps all day"))?;

        let results = engine.search(&SearchQuery::keyword("cAT sLeEps")).await?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content.id, id);
        assert_eq!(results[0].score, None);
        assert_eq!(results[0].snippet, "My Cat sleeps all day");

        // Title matches too
        assert_eq!(engine.search(&SearchQuery::keyword("pets")).await?.len(), 1);
        assert!(engine.search(&SearchQuery::keyword("giraffe")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_keyword_wildcards_are_literal() -> Result<()> {
        let (_dir, repo, _store, engine) = setup(Arc::new(AxisEmbedder));
        repo.create(&ContentDraft::new(ContentType::Note, "growth", "up 100 percent"))?;

        assert!(engine.search(&SearchQuery::keyword("100%")).await?.is_empty());
        assert!(engine.search(&SearchQuery::keyword("_")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let (_dir, _repo, _store, engine) = setup(Arc::new(AxisEmbedder));
        for query in [SearchQuery::keyword("  "), SearchQuery::semantic("")] {
            let err = engine.search(&query).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_keyword_type_filter() -> Result<()> {
        let (_dir, repo, _store, engine) = setup(Arc::new(AxisEmbedder));
        repo.create(&ContentDraft::new(ContentType::Note, "a", "shared text"))?;
        let doc = repo.create(&ContentDraft::new(ContentType::Document, "b", "shared text"))?;

        let results = engine
            .search(&SearchQuery::keyword("shared").with_type(ContentType::Document))
            .await?;
        assert_eq!(results.iter().map(|r| r.content.id).collect::<Vec<_>>(), vec![doc]);
        Ok(())
    }

    #[tokio::test]
    async fn test_semantic_ranking() -> Result<()> {
        let (_dir, repo, store, engine) = setup(Arc::new(AxisEmbedder));
        let cat = repo.create(&ContentDraft::new(ContentType::Note, "cat", "about cats"))?;
        let both = repo.create(&ContentDraft::new(ContentType::Note, "both", "cats and dogs"))?;
        let car = repo.create(&ContentDraft::new(ContentType::Note, "car", "about cars"))?;
        store.store_vector(cat, &[1.0, 0.0, 0.0], "axis")?;
        store.store_vector(both, &[1.0, 1.0, 0.0], "axis")?;
        store.store_vector(car, &[0.0, 0.0, 1.0], "axis")?;

        let results = engine.search(&SearchQuery::semantic("cat")).await?;
        let ids: Vec<i64> = results.iter().map(|r| r.content.id).collect();
        assert_eq!(ids, vec![cat, both, car]);

        let scores: Vec<f32> = results.iter().map(|r| r.score.unwrap()).collect();
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(scores[2], 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_semantic_ignores_other_models() -> Result<()> {
        let (_dir, repo, store, engine) = setup(Arc::new(AxisEmbedder));
        let id = repo.create(&ContentDraft::new(ContentType::Note, "cat", "cat"))?;
        store.store_vector(id, &[1.0, 0.0, 0.0], "some-other-model")?;

        assert!(engine.search(&SearchQuery::semantic("cat")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_semantic_generator_failure_is_surfaced() -> Result<()> {
        let (_dir, repo, store, engine) = setup(Arc::new(DownEmbedder));
        let id = repo.create(&ContentDraft::new(ContentType::Note, "cat", "cat"))?;
        store.store_vector(id, &[1.0, 0.0, 0.0], "axis")?;

        let err = engine.search(&SearchQuery::semantic("cat")).await.unwrap_err();
        assert!(matches!(err, Error::Generator(GeneratorError::Unavailable(_))));
        Ok(())
    }
}
