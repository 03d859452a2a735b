//! Embedding and summarization generators
//!
//! The knowledge base only talks to these through the two traits below, so
//! tests and offline use can swap in local implementations.

pub mod harmonic;
pub mod openai;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use harmonic::HarmonicEmbedder;
pub use openai::{OpenAiClient, OpenAiConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns text into a fixed-length vector
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    async fn generate(&self, text: &str) -> Result<Vec<f32>, GeneratorError>;

    /// Identifier stored alongside every vector this generator produces
    fn model_name(&self) -> &str;
}

/// Turns text into a short natural-language summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, GeneratorError>;
}

/// Bound a generator call. Dropping the returned future (client went away)
/// drops the in-flight call with it.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, GeneratorError>
where
    F: Future<Output = Result<T, GeneratorError>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| GeneratorError::Timeout(deadline))?
}
