//! Similarity, ordering and windowing shared by both search modes

use std::cmp::Ordering;

use crate::core::model::SearchResult;
use crate::db::content::effective_limit;

/// Cosine similarity between two embeddings.
///
/// Mismatched lengths and zero-norm vectors score 0.0 rather than failing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |(d, na, nb), (&x, &y)| {
        let (x, y) = (x as f64, y as f64);
        (d + x * y, na + x * x, nb + y * y)
    });

    if norm_a > 0.0 && norm_b > 0.0 {
        (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
    } else {
        0.0
    }
}

/// Highest score first. Stable, so equal scores keep retrieval order.
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        let (a, b) = (a.score.unwrap_or(0.0), b.score.unwrap_or(0.0));
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });
}

/// Offset/limit window over an already ordered list. An offset past the end
/// yields nothing; the tail is clipped to what is available.
pub fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let limit = effective_limit(limit);
    let offset = offset.max(0) as usize;
    items.into_iter().skip(offset).take(limit).collect()
}

/// Content tags must include every required tag (extra tags are fine)
pub fn has_all_tags(content_tags: &[String], required: &[String]) -> bool {
    required.iter().all(|tag| content_tags.contains(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Content, ContentType};
    use chrono::Utc;

    fn result(id: i64, score: f32) -> SearchResult {
        let now = Utc::now();
        SearchResult {
            content: Content {
                id,
                content_type: ContentType::Note,
                title: format!("note {id}"),
                body: String::new(),
                source_url: None,
                file_path: None,
                created_at: now,
                updated_at: now,
                tags: Vec::new(),
            },
            score: Some(score),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        let v = vec![0.3, -1.7, 2.2, 0.01];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_sort_by_score_is_stable() {
        let mut results = vec![result(1, 0.2), result(2, 0.9), result(3, 0.2), result(4, 0.5)];
        sort_by_score(&mut results);
        let ids: Vec<i64> = results.iter().map(|r| r.content.id).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(paginate(items.clone(), 0, 0), (0..10).collect::<Vec<_>>());
        assert_eq!(paginate(items.clone(), 5, 22), vec![22, 23, 24]);
        assert_eq!(paginate(items.clone(), 3, -4), vec![0, 1, 2]);
        assert!(paginate(items.clone(), 5, 25).is_empty());
        assert!(paginate(items, 5, 100).is_empty());
    }

    #[test]
    fn test_has_all_tags() {
        let tags = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        assert!(has_all_tags(&tags, &["x".to_string(), "y".to_string()]));
        assert!(has_all_tags(&tags, &[]));
        assert!(!has_all_tags(&tags[..1], &["x".to_string(), "y".to_string()]));
    }
}
