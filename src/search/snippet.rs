//! Context snippets around the first query match

use crate::core::text::fold_case;

/// Characters kept on each side of a match
const CONTEXT_CHARS: usize = 75;

/// Characters shown when the query does not occur in the body
const PREVIEW_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// Excerpt of `body` around the first case-insensitive occurrence of
/// `query`, or the opening of the body when there is none.
///
/// All positions are in characters, so multi-byte text never splits.
pub fn extract_snippet(body: &str, query: &str) -> String {
    if body.is_empty() || query.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = body.chars().collect();
    let needle: Vec<char> = query.chars().map(fold_case).collect();

    let Some(index) = find_folded(&chars, &needle) else {
        if chars.len() > PREVIEW_CHARS {
            let preview: String = chars[..PREVIEW_CHARS].iter().collect();
            return preview + ELLIPSIS;
        }
        return body.to_string();
    };

    let start = index.saturating_sub(CONTEXT_CHARS);
    let end = (index + needle.len() + CONTEXT_CHARS).min(chars.len());

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&chars[start..end]);
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

fn find_folded(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w.iter().zip(needle).all(|(&h, &n)| fold_case(h) == n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_near_start_has_no_ellipsis() {
        let snippet = extract_snippet("the quick brown fox", "quick");
        assert_eq!(snippet, "the quick brown fox");
        assert!(!snippet.starts_with("..."));
        assert!(!snippet.ends_with("..."));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(extract_snippet("", "quick"), "");
        assert_eq!(extract_snippet("body", ""), "");
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(extract_snippet("The QUICK fox", "quick"), "The QUICK fox");
    }

    #[test]
    fn test_final_sigma_matches() {
        let body = format!("{} ΟΔΟΣ {}", "x".repeat(200), "y".repeat(200));
        let snippet = extract_snippet(&body, "οδος");
        assert!(snippet.contains("ΟΔΟΣ"));
        assert!(snippet.starts_with("..."));
    }

    #[test]
    fn test_window_in_long_body() {
        let body = format!("{}needle{}", "a".repeat(200), "b".repeat(200));
        let snippet = extract_snippet(&body, "Needle");

        let expected = format!("...{}needle{}...", "a".repeat(75), "b".repeat(75));
        assert_eq!(snippet, expected);
    }

    #[test]
    fn test_window_clamped_at_end() {
        let body = format!("{}tail", "x".repeat(100));
        let snippet = extract_snippet(&body, "tail");
        assert_eq!(snippet, format!("...{}tail", "x".repeat(75)));
    }

    #[test]
    fn test_no_match_previews_opening() {
        let short = "nothing to see here";
        assert_eq!(extract_snippet(short, "absent"), short);

        let long = "z".repeat(151);
        assert_eq!(extract_snippet(&long, "absent"), format!("{}...", "z".repeat(150)));

        let exact = "z".repeat(150);
        assert_eq!(extract_snippet(&exact, "absent"), exact);
    }

    #[test]
    fn test_multibyte_text() {
        let body = format!("{}검색 엔진{}", "가".repeat(100), "나".repeat(100));
        let snippet = extract_snippet(&body, "검색");
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert!(snippet.contains("검색 엔진"));
        assert_eq!(snippet.chars().count(), 3 + 75 + 2 + 75 + 3);
    }
}
