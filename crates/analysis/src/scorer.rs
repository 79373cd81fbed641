//! Relevance scoring
//!
//! This module provides:
//! - `CandidateSignals`: the raw gram-match signals accumulated per
//!   candidate while walking posting lists
//! - `RelevanceScorer`: combines exact-word, n-gram, and edge-gram signals
//!   into one score using the configured weights
//!
//! The three tiers privilege exact matches over prefix matches over pure
//! trigram overlap: exact hits add a large fixed boost per matched term,
//! edge-gram hits scale with prefix length, and n-gram hits contribute a
//! small fixed weight each. The result is a raw weighted sum with no
//! normalization by document or query length.

use gramdex_core::SearchConfig;
use std::collections::HashSet;

// ============================================================================
// CandidateSignals
// ============================================================================

/// Raw posting-match signals for one candidate document
///
/// Accumulated additively across every gram of every query term; a document
/// appearing under multiple grams collects one contribution per hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CandidateSignals {
    /// Number of n-gram posting hits
    pub ngram_matches: u32,
    /// Sum of `gram_len / max_edgegram` over edge-gram posting hits
    ///
    /// Longer prefixes are more specific, so they contribute
    /// proportionally more before `edgegram_weight` is applied.
    pub edge_weight: f64,
}

impl CandidateSignals {
    /// Record one n-gram posting hit
    pub fn record_ngram_hit(&mut self) {
        self.ngram_matches += 1;
    }

    /// Record one edge-gram posting hit for a gram of `gram_len` characters
    pub fn record_edge_hit(&mut self, gram_len: usize, max_edgegram: usize) {
        if max_edgegram == 0 {
            return;
        }
        self.edge_weight += gram_len as f64 / max_edgegram as f64;
    }
}

// ============================================================================
// RelevanceScorer
// ============================================================================

/// Combines match signals into a single relevance score
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    config: SearchConfig,
}

impl RelevanceScorer {
    /// Create a scorer using the given weights
    pub fn new(config: SearchConfig) -> Self {
        RelevanceScorer { config }
    }

    /// Score one candidate document
    ///
    /// The exact-word boost is applied once per distinct query term found
    /// verbatim in the document's lowercased, whitespace-split word list —
    /// not once per occurrence. Gram signals are added as
    /// `ngram_matches * ngram_weight + edge_weight * edgegram_weight`.
    pub fn score(&self, content: &str, terms: &[String], signals: &CandidateSignals) -> f64 {
        let lowered = content.to_lowercase();
        let doc_words: HashSet<&str> = lowered.split_whitespace().collect();

        let mut score = 0.0;
        for term in terms {
            if doc_words.contains(term.to_lowercase().as_str()) {
                score += self.config.exact_match_boost;
            }
        }

        score += f64::from(signals.ngram_matches) * self.config.ngram_weight;
        score += signals.edge_weight * self.config.edgegram_weight;
        score
    }

    /// The configuration this scorer was built from
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}
