//! Highlight snippet generation
//!
//! Given a document's content and the normalized query terms, this module
//! extracts context windows around each case-insensitive match and wraps
//! matched text in `<mark>` tags.
//!
//! The snippet budget is shared across ALL terms combined: once
//! `max_highlights` snippets exist, generation stops mid-term, so a
//! multi-term query can spend its whole budget on the first term's matches.
//! Callers depend on this exact accounting.

/// Default number of snippets per result
pub const DEFAULT_MAX_HIGHLIGHTS: usize = 3;

/// Default number of context characters on each side of a match
pub const DEFAULT_CONTEXT_LENGTH: usize = 30;

/// Marker wrapped around matched text
const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

/// Ellipsis affixed where a window stops short of a content boundary
const ELLIPSIS: &str = "...";

/// Generate highlighted context snippets for `terms` within `content`
///
/// For every term, matches are located case-insensitively left to right,
/// continuing one character past each found index. Each match yields a
/// window of `context_length` characters on both sides; every
/// case-insensitive occurrence of the term inside that window is wrapped in
/// `<mark>` tags, and `...` is affixed on sides where the window does not
/// reach the content boundary.
///
/// # Example
///
/// ```
/// use gramdex_analysis::highlight::generate_highlights;
///
/// let snippets = generate_highlights("Rust is fast", &["rust".to_string()], 3, 30);
/// assert_eq!(snippets, vec!["<mark>Rust</mark> is fast"]);
/// ```
pub fn generate_highlights(
    content: &str,
    terms: &[String],
    max_highlights: usize,
    context_length: usize,
) -> Vec<String> {
    let mut highlights = Vec::new();
    if content.is_empty() || max_highlights == 0 {
        return highlights;
    }

    let chars: Vec<char> = content.chars().collect();
    let lower: Vec<char> = chars.iter().map(|&c| fold_char(c)).collect();

    for term in terms {
        let term_chars: Vec<char> = term.chars().map(fold_char).collect();
        if term_chars.is_empty() {
            continue;
        }

        let mut from = 0;
        while let Some(idx) = find_from(&lower, &term_chars, from) {
            // Aggregate budget across the whole term set
            if highlights.len() >= max_highlights {
                return highlights;
            }

            let start = idx.saturating_sub(context_length);
            let end = (idx + term_chars.len() + context_length).min(chars.len());

            let mut snippet = String::new();
            if start > 0 {
                snippet.push_str(ELLIPSIS);
            }
            snippet.push_str(&mark_occurrences(
                &chars[start..end],
                &lower[start..end],
                &term_chars,
            ));
            if end < chars.len() {
                snippet.push_str(ELLIPSIS);
            }

            highlights.push(snippet);
            from = idx + 1;
        }
    }

    highlights
}

/// Case-fold one character to a single character
///
/// `char::to_lowercase` can expand to multiple characters for a handful of
/// code points; taking the first keeps original and folded text aligned
/// index-for-index, which the window arithmetic relies on.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Find the first occurrence of `needle` in `haystack` at or after `from`
fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Wrap every occurrence of `term` within the window in mark tags
///
/// Occurrences are matched against the folded window but emitted from the
/// original characters, preserving the document's casing.
fn mark_occurrences(window: &[char], window_lower: &[char], term: &[char]) -> String {
    let mut out = String::with_capacity(window.len());
    let mut i = 0;
    while i < window.len() {
        if i + term.len() <= window.len() && window_lower[i..i + term.len()] == *term {
            out.push_str(MARK_OPEN);
            out.extend(&window[i..i + term.len()]);
            out.push_str(MARK_CLOSE);
            i += term.len();
        } else {
            out.push(window[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_match_whole_content() {
        let snippets = generate_highlights("Rust is fast", &terms(&["rust"]), 3, 30);
        assert_eq!(snippets, vec!["<mark>Rust</mark> is fast"]);
    }

    #[test]
    fn test_case_insensitive_matching_preserves_original_case() {
        let snippets = generate_highlights("TypeScript and typescript", &terms(&["typescript"]), 3, 50);
        assert_eq!(snippets.len(), 2);
        // Both occurrences fall inside each window and both get wrapped
        assert!(snippets[0].contains("<mark>TypeScript</mark>"));
        assert!(snippets[0].contains("<mark>typescript</mark>"));
    }

    #[test]
    fn test_ellipsis_on_both_sides() {
        let content = format!("{} needle {}", "x".repeat(100), "y".repeat(100));
        let snippets = generate_highlights(&content, &terms(&["needle"]), 3, 10);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].starts_with(ELLIPSIS));
        assert!(snippets[0].ends_with(ELLIPSIS));
        assert!(snippets[0].contains("<mark>needle</mark>"));
    }

    #[test]
    fn test_no_ellipsis_at_content_boundary() {
        let snippets = generate_highlights("needle in the middle of it", &terms(&["needle"]), 3, 30);
        assert_eq!(snippets, vec!["<mark>needle</mark> in the middle of it"]);
    }

    #[test]
    fn test_window_length() {
        let content = format!("{}needle{}", "a".repeat(50), "b".repeat(50));
        let snippets = generate_highlights(&content, &terms(&["needle"]), 3, 5);
        // 5 context chars + ellipses on both sides
        assert_eq!(
            snippets,
            vec!["...aaaaa<mark>needle</mark>bbbbb..."]
        );
    }

    #[test]
    fn test_budget_is_aggregate_across_terms() {
        // Three matches for the first term exhaust the budget before the
        // second term is ever visited.
        let content = "alpha alpha alpha beta";
        let snippets = generate_highlights(content, &terms(&["alpha", "beta"]), 3, 5);
        assert_eq!(snippets.len(), 3);
        for snippet in &snippets {
            assert!(snippet.contains("<mark>alpha</mark>"));
            assert!(!snippet.contains("<mark>beta</mark>"));
        }
    }

    #[test]
    fn test_budget_short_circuits_mid_term() {
        let content = "word word word word word";
        let snippets = generate_highlights(content, &terms(&["word"]), 2, 4);
        assert_eq!(snippets.len(), 2);
    }

    #[test]
    fn test_second_term_highlighted_when_budget_remains() {
        let snippets = generate_highlights("alpha beta", &terms(&["alpha", "beta"]), 3, 30);
        assert_eq!(snippets.len(), 2);
        assert!(snippets[0].contains("<mark>alpha</mark>"));
        assert!(snippets[1].contains("<mark>beta</mark>"));
    }

    #[test]
    fn test_no_match_yields_nothing() {
        assert!(generate_highlights("nothing here", &terms(&["absent"]), 3, 30).is_empty());
    }

    #[test]
    fn test_empty_content_and_empty_terms() {
        assert!(generate_highlights("", &terms(&["x"]), 3, 30).is_empty());
        assert!(generate_highlights("content", &[], 3, 30).is_empty());
        assert!(generate_highlights("content", &terms(&[""]), 3, 30).is_empty());
    }

    #[test]
    fn test_zero_budget() {
        assert!(generate_highlights("word", &terms(&["word"]), 0, 30).is_empty());
    }

    #[test]
    fn test_overlapping_matches_continue_after_found_index() {
        // Scanning resumes one character past each match, so "aa" in "aaa"
        // matches at index 0 and again at index 1.
        let snippets = generate_highlights("aaa", &terms(&["aa"]), 5, 10);
        assert_eq!(snippets.len(), 2);
    }

    #[test]
    fn test_multibyte_content_windows() {
        let content = "das Übermaß überwiegt";
        let snippets = generate_highlights(content, &terms(&["über"]), 3, 4);
        assert_eq!(snippets.len(), 2);
        assert!(snippets[0].contains("<mark>Über</mark>"));
        assert!(snippets[1].contains("<mark>über</mark>"));
    }
}
