//! Knowledge base service
//!
//! The one API surface the CLI and the MCP server call into. Writes commit
//! synchronously and then refresh the content's embedding in a detached task;
//! reads and searches go straight to the store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::core::model::{Content, ContentDraft, ContentType, SearchQuery, SearchResult, Tag, TagUsage};
use crate::db::{ContentRepository, Database, EmbeddingStore, StoreStats};
use crate::error::{Error, Result};
use crate::generator::{with_deadline, EmbeddingGenerator, HarmonicEmbedder, OpenAiClient, Summarizer};
use crate::search::SearchEngine;

/// Outcome of an explicit embedding request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingReceipt {
    pub content_id: i64,
    pub embedding_id: i64,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Clone)]
pub struct KnowledgeBase {
    db: Database,
    content: ContentRepository,
    embeddings: EmbeddingStore,
    engine: SearchEngine,
    embedder: Arc<dyn EmbeddingGenerator>,
    summarizer: Option<Arc<dyn Summarizer>>,
    deadline: Duration,
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl KnowledgeBase {
    pub fn new(
        db: Database,
        embedder: Arc<dyn EmbeddingGenerator>,
        summarizer: Option<Arc<dyn Summarizer>>,
        deadline: Duration,
    ) -> Self {
        Self {
            content: ContentRepository::new(db.clone()),
            embeddings: EmbeddingStore::new(db.clone()),
            engine: SearchEngine::new(db.clone(), embedder.clone(), deadline),
            db,
            embedder,
            summarizer,
            deadline,
            background: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Open the configured database and pick generators: the OpenAI backend
    /// when a key is present, the offline HTP embedder otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(&config.paths.database)?;

        let (embedder, summarizer): (Arc<dyn EmbeddingGenerator>, Option<Arc<dyn Summarizer>>) =
            match &config.openai {
                Some(openai) => {
                    let client = Arc::new(OpenAiClient::new(openai.clone())?);
                    let embedder: Arc<dyn EmbeddingGenerator> = client.clone();
                    let summarizer: Arc<dyn Summarizer> = client;
                    (embedder, Some(summarizer))
                }
                None => {
                    info!("no OpenAI key configured, using offline embedder");
                    let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(HarmonicEmbedder::new());
                    (embedder, None)
                }
            };

        Ok(Self::new(db, embedder, summarizer, config.generator_timeout))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Model id stored with every vector this instance writes
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn can_summarize(&self) -> bool {
        self.summarizer.is_some()
    }

    pub async fn create_content(&self, draft: ContentDraft) -> Result<Content> {
        validate_draft(&draft)?;
        let id = self.content.create(&draft)?;
        let content = self.content.get(id)?;
        self.refresh_embedding(&content);

        info!(content_id = id, content_type = %content.content_type, "content created");
        Ok(content)
    }

    pub fn get_content(&self, id: i64) -> Result<Content> {
        self.content.get(id)
    }

    pub fn list_content(&self, content_type: Option<ContentType>, limit: i64, offset: i64) -> Result<Vec<Content>> {
        self.content.list(content_type, limit, offset)
    }

    pub async fn update_content(&self, id: i64, draft: ContentDraft) -> Result<Content> {
        validate_draft(&draft)?;
        if !self.content.update(id, &draft)? {
            return Err(Error::content_not_found(id));
        }
        let content = self.content.get(id)?;
        self.refresh_embedding(&content);

        info!(content_id = id, "content updated");
        Ok(content)
    }

    pub fn delete_content(&self, id: i64) -> Result<()> {
        if !self.content.delete(id)? {
            return Err(Error::content_not_found(id));
        }
        info!(content_id = id, "content deleted");
        Ok(())
    }

    /// Embed the body now and store it, waiting for the result
    pub async fn generate_embedding(&self, id: i64) -> Result<EmbeddingReceipt> {
        let content = self.content.get(id)?;
        if content.body.trim().is_empty() {
            return Err(Error::Validation(format!("content {id} has no body to embed")));
        }

        let vector = with_deadline(self.deadline, self.embedder.generate(&content.body)).await?;
        let model = self.embedder.model_name().to_string();
        let embedding_id = self.embeddings.store_vector(id, &vector, &model)?;

        info!(content_id = id, model = %model, dimensions = vector.len(), "embedding generated");
        Ok(EmbeddingReceipt {
            content_id: id,
            embedding_id,
            model,
            dimensions: vector.len(),
        })
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.engine.search(query).await
    }

    pub async fn summarize(&self, id: i64) -> Result<String> {
        let summarizer = self
            .summarizer
            .as_ref()
            .ok_or_else(|| Error::Config("summarization requires OPENAI_API_KEY".to_string()))?;

        let content = self.content.get(id)?;
        if content.body.trim().is_empty() {
            return Err(Error::Validation(format!("content {id} has no body to summarize")));
        }

        let summary = with_deadline(self.deadline, summarizer.summarize(&content.body)).await?;
        debug!(content_id = id, len = summary.len(), "summary generated");
        Ok(summary)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        self.content.list_tags()
    }

    pub fn create_tag(&self, name: &str) -> Result<Tag> {
        self.content.create_tag(name)
    }

    pub fn tag_usage(&self) -> Result<Vec<TagUsage>> {
        self.content.tag_usage()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.db.stats()
    }

    /// Await every refresh spawned so far. Their outcomes stay in the log.
    pub async fn wait_for_background(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.background.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "embedding refresh task aborted");
            }
        }
    }

    /// Fire-and-forget: generate and store an embedding for the committed
    /// body. Failures are logged and dropped.
    fn refresh_embedding(&self, content: &Content) {
        if content.body.trim().is_empty() {
            return;
        }

        let content_id = content.id;
        let body = content.body.clone();
        let embedder = self.embedder.clone();
        let store = self.embeddings.clone();
        let deadline = self.deadline;

        let handle = tokio::spawn(async move {
            let model = embedder.model_name().to_string();
            let vector = match with_deadline(deadline, embedder.generate(&body)).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(content_id, model = %model, error = %e, "embedding refresh failed");
                    return;
                }
            };

            match store.store_vector(content_id, &vector, &model) {
                Ok(_) => debug!(content_id, model = %model, "embedding refreshed"),
                Err(e) => warn!(content_id, model = %model, error = %e, "failed to store embedding"),
            }
        });

        let mut guard = self.background.lock().unwrap_or_else(|e| e.into_inner());
        guard.retain(|h| !h.is_finished());
        guard.push(handle);
    }
}

fn validate_draft(draft: &ContentDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, KnowledgeBase) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("kb.db")).unwrap();
        let kb = KnowledgeBase::new(db, Arc::new(HarmonicEmbedder::new()), None, Duration::from_secs(5));
        (dir, kb)
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let (_dir, kb) = open();
        let err = kb
            .create_content(ContentDraft::new(ContentType::Note, "   ", "body"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(kb.stats().unwrap().content_count, 0);
    }

    #[tokio::test]
    async fn test_create_refreshes_embedding() -> Result<()> {
        let (_dir, kb) = open();
        let content = kb
            .create_content(ContentDraft::new(ContentType::Note, "title", "some body text"))
            .await?;
        kb.wait_for_background().await;

        let vector = kb.embeddings.load_vector(content.id, kb.model_name())?;
        assert_eq!(vector.len(), crate::generator::harmonic::HTP_DIMENSIONS);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_body_skips_refresh() -> Result<()> {
        let (_dir, kb) = open();
        let content = kb
            .create_content(ContentDraft::new(ContentType::Bookmark, "link only", ""))
            .await?;
        kb.wait_for_background().await;

        assert_eq!(kb.embeddings.count_for(content.id)?, 0);
        let err = kb.generate_embedding(content.id).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let (_dir, kb) = open();
        let draft = ContentDraft::new(ContentType::Note, "t", "b");
        assert!(kb.update_content(99, draft).await.unwrap_err().is_not_found());
        assert!(kb.delete_content(99).unwrap_err().is_not_found());
        assert!(kb.generate_embedding(99).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_summarize_without_backend() -> Result<()> {
        let (_dir, kb) = open();
        let content = kb
            .create_content(ContentDraft::new(ContentType::Note, "t", "body"))
            .await?;
        assert!(!kb.can_summarize());
        assert!(matches!(kb.summarize(content.id).await, Err(Error::Config(_))));
        kb.wait_for_background().await;
        Ok(())
    }
}
