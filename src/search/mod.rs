//! Search over the knowledge base
//!
//! Keyword mode: case-insensitive substring match, newest first
//! Semantic mode: cosine similarity against stored embeddings, best first

pub mod engine;
pub mod rank;
pub mod snippet;

pub use engine::SearchEngine;
pub use rank::cosine_similarity;
pub use snippet::extract_snippet;
