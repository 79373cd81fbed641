//! Text analysis: normalization and gram generation
//!
//! This module provides the pure functions that turn raw text into the two
//! token families the engine indexes:
//! - n-grams: fixed-length sliding windows over each word, for fuzzy and
//!   typo-tolerant matching
//! - edge-grams: variable-length word prefixes, for instant/typeahead-style
//!   matching (longer prefixes are weighted higher at scoring time)
//!
//! All functions operate on characters, not bytes, so multi-byte content
//! never splits a code point.

use std::collections::HashSet;

/// Normalize text for gram generation
///
/// Lowercases, replaces every run of non-word characters with a single
/// space, trims, and collapses internal whitespace. Word characters are
/// alphanumerics plus `_`.
///
/// # Example
///
/// ```
/// use gramdex_analysis::analyzer::normalize;
///
/// assert_eq!(normalize("  Hello,   WORLD!! "), "hello world");
/// ```
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize and split into words
pub fn words(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// Generate deduplicated character n-grams for every word in `text`
///
/// Each word of length >= `n` contributes every contiguous window of `n`
/// characters (step 1). Words shorter than `n` contribute nothing. The
/// result preserves first-seen order; order carries no semantic meaning.
///
/// # Example
///
/// ```
/// use gramdex_analysis::analyzer::build_ngrams;
///
/// assert_eq!(build_ngrams("cats", 3), vec!["cat", "ats"]);
/// assert!(build_ngrams("ab", 3).is_empty());
/// ```
pub fn build_ngrams(text: &str, n: usize) -> Vec<String> {
    if n == 0 {
        return vec![];
    }

    let mut seen = HashSet::new();
    let mut grams = Vec::new();

    for word in words(text) {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < n {
            continue;
        }
        for window in chars.windows(n) {
            let gram: String = window.iter().collect();
            if seen.insert(gram.clone()) {
                grams.push(gram);
            }
        }
    }

    grams
}

/// Generate deduplicated edge-grams (word prefixes) for every word in `text`
///
/// Each word contributes its prefixes of length `min_gram` through
/// `min(max_gram, word length)`. A `min_gram > max_gram` configuration is
/// degenerate-but-valid and yields nothing.
///
/// # Example
///
/// ```
/// use gramdex_analysis::analyzer::build_edge_grams;
///
/// assert_eq!(build_edge_grams("tutorial", 2, 4), vec!["tu", "tut", "tuto"]);
/// ```
pub fn build_edge_grams(text: &str, min_gram: usize, max_gram: usize) -> Vec<String> {
    if min_gram > max_gram {
        return vec![];
    }
    let min_gram = min_gram.max(1);

    let mut seen = HashSet::new();
    let mut grams = Vec::new();

    for word in words(text) {
        let chars: Vec<char> = word.chars().collect();
        let upper = max_gram.min(chars.len());
        for len in min_gram..=upper {
            let gram: String = chars[..len].iter().collect();
            if seen.insert(gram.clone()) {
                grams.push(gram);
            }
        }
    }

    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn test_normalize_collapses_punctuation_runs() {
        assert_eq!(normalize("real---time...chat"), "real time chat");
    }

    #[test]
    fn test_normalize_keeps_underscores_and_digits() {
        assert_eq!(normalize("user_42 logged-in"), "user_42 logged in");
    }

    #[test]
    fn test_normalize_trims_and_collapses_whitespace() {
        assert_eq!(normalize("   a \t b\n\nc  "), "a b c");
    }

    #[test]
    fn test_normalize_empty_and_punctuation_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("...---..."), "");
    }

    #[test]
    fn test_ngrams_exact_length_word() {
        assert_eq!(build_ngrams("cat", 3), vec!["cat"]);
    }

    #[test]
    fn test_ngrams_sliding_window() {
        assert_eq!(build_ngrams("cats", 3), vec!["cat", "ats"]);
    }

    #[test]
    fn test_ngrams_short_word_contributes_nothing() {
        assert!(build_ngrams("ab", 3).is_empty());
    }

    #[test]
    fn test_ngrams_multiple_words() {
        assert_eq!(
            build_ngrams("cat hat", 3),
            vec!["cat".to_string(), "hat".to_string()]
        );
    }

    #[test]
    fn test_ngrams_deduplicated() {
        // "cat cat" and the shared windows of "catcat" appear once each
        assert_eq!(build_ngrams("cat cat", 3), vec!["cat"]);
        assert_eq!(
            build_ngrams("catcat", 3),
            vec!["cat", "atc", "tca"]
        );
    }

    #[test]
    fn test_ngrams_normalizes_input() {
        assert_eq!(build_ngrams("CAT!", 3), vec!["cat"]);
    }

    #[test]
    fn test_ngrams_zero_n_is_empty() {
        assert!(build_ngrams("cat", 0).is_empty());
    }

    #[test]
    fn test_ngrams_multibyte_characters() {
        // Windows are per character, never per byte
        assert_eq!(build_ngrams("über", 3), vec!["übe", "ber"]);
    }

    #[test]
    fn test_edge_grams_basic() {
        assert_eq!(build_edge_grams("tutorial", 2, 4), vec!["tu", "tut", "tuto"]);
    }

    #[test]
    fn test_edge_grams_capped_by_word_length() {
        assert_eq!(build_edge_grams("cat", 2, 10), vec!["ca", "cat"]);
    }

    #[test]
    fn test_edge_grams_degenerate_range() {
        assert!(build_edge_grams("tutorial", 5, 2).is_empty());
    }

    #[test]
    fn test_edge_grams_deduplicated_across_words() {
        // Both words share the "tu"/"tut" prefixes
        assert_eq!(
            build_edge_grams("tutor tutorial", 2, 3),
            vec!["tu", "tut"]
        );
    }

    #[test]
    fn test_edge_grams_word_shorter_than_min() {
        assert!(build_edge_grams("a", 2, 4).is_empty());
    }

    #[test]
    fn test_words_splits_normalized_text() {
        assert_eq!(words("Real-Time chat"), vec!["real", "time", "chat"]);
        assert!(words("!!!").is_empty());
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(text in ".{0,80}") {
                let once = normalize(&text);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn ngrams_have_exact_length(text in "[a-zA-Z ]{0,40}", n in 1usize..6) {
                for gram in build_ngrams(&text, n) {
                    prop_assert_eq!(gram.chars().count(), n);
                }
            }

            #[test]
            fn edge_grams_are_word_prefixes(text in "[a-zA-Z ]{0,40}") {
                let word_list = words(&text);
                for gram in build_edge_grams(&text, 2, 10) {
                    prop_assert!(word_list.iter().any(|w| w.starts_with(&gram)));
                }
            }

            #[test]
            fn grams_are_unique(text in ".{0,60}") {
                let ngrams = build_ngrams(&text, 3);
                let unique: std::collections::HashSet<_> = ngrams.iter().collect();
                prop_assert_eq!(unique.len(), ngrams.len());

                let edges = build_edge_grams(&text, 2, 10);
                let unique: std::collections::HashSet<_> = edges.iter().collect();
                prop_assert_eq!(unique.len(), edges.len());
            }
        }
    }
}
