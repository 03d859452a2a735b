//! pkb library
//!
//! Personal knowledge base: tagged text content stored in SQLite, retrieved
//! by keyword substring match or by cosine similarity over embeddings.
//!
//! # Modules
//!
//! - `core`: Content/tag model, configuration and data paths
//! - `db`: SQLite schema, content repository and embedding store
//! - `generator`: Embedding and summarization backends
//! - `search`: Keyword and semantic search, ranking, snippets
//! - `knowledge`: The API surface used by the CLI and the MCP server

pub mod core;
pub mod db;
pub mod error;
pub mod generator;
pub mod knowledge;
pub mod search;

// Re-exports for convenience
pub use core::config::Config;
pub use core::model::{Content, ContentDraft, ContentType, SearchQuery, SearchResult, Tag};
pub use db::Database;
pub use error::{Error, Result};
pub use generator::{EmbeddingGenerator, GeneratorError, Summarizer};
pub use knowledge::KnowledgeBase;
