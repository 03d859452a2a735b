//! Shared fixtures: a temporary knowledge base and local generators

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pkb::{Database, EmbeddingGenerator, GeneratorError, KnowledgeBase, Summarizer};
use tempfile::TempDir;

pub const MODEL: &str = "fake-axis";

/// Scores text on a few fixed vocabulary axes
pub struct AxisEmbedder;

pub const AXES: [&str; 4] = ["cat", "dog", "car", "rust"];

#[async_trait]
impl EmbeddingGenerator for AxisEmbedder {
    async fn generate(&self, text: &str) -> Result<Vec<f32>, GeneratorError> {
        let text = text.to_lowercase();
        Ok(AXES
            .iter()
            .map(|axis| text.matches(axis).count() as f32)
            .collect())
    }

    fn model_name(&self) -> &str {
        MODEL
    }
}

/// Same vector for every input
pub struct ConstantEmbedder;

#[async_trait]
impl EmbeddingGenerator for ConstantEmbedder {
    async fn generate(&self, _text: &str) -> Result<Vec<f32>, GeneratorError> {
        Ok(vec![1.0, 0.0])
    }

    fn model_name(&self) -> &str {
        MODEL
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingGenerator for FailingEmbedder {
    async fn generate(&self, _text: &str) -> Result<Vec<f32>, GeneratorError> {
        Err(GeneratorError::Unavailable("connection refused".to_string()))
    }

    fn model_name(&self) -> &str {
        MODEL
    }
}

/// Never answers within any reasonable deadline
pub struct StalledEmbedder;

#[async_trait]
impl EmbeddingGenerator for StalledEmbedder {
    async fn generate(&self, _text: &str) -> Result<Vec<f32>, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![1.0])
    }

    fn model_name(&self) -> &str {
        MODEL
    }
}

/// Returns the first sentence of the text
pub struct FirstSentenceSummarizer;

#[async_trait]
impl Summarizer for FirstSentenceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, GeneratorError> {
        Ok(text.split('.').next().unwrap_or_default().trim().to_string() + ".")
    }
}

pub fn open_with(embedder: Arc<dyn EmbeddingGenerator>, summarizer: Option<Arc<dyn Summarizer>>) -> (TempDir, KnowledgeBase) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::open(&dir.path().join("kb.db")).expect("open database");
    let kb = KnowledgeBase::new(db, embedder, summarizer, Duration::from_secs(5));
    (dir, kb)
}

pub fn open() -> (TempDir, KnowledgeBase) {
    open_with(Arc::new(AxisEmbedder), None)
}
