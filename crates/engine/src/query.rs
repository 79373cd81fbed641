//! Shared, backend-agnostic query execution
//!
//! This module provides:
//! - `QueryPlan`: normalized query terms plus each term's derived grams
//! - `CandidateAccumulator`: per-candidate signal accumulation while
//!   walking posting lists
//! - `finalize`: filtering, scoring, ordering, pagination, and highlight
//!   attachment shared by every backend
//!
//! Backends differ only in how postings are looked up and documents are
//! fetched; everything in this module is pure computation, so the same
//! query against the same data ranks identically on any backend.

use gramdex_analysis::{
    build_edge_grams, build_ngrams, generate_highlights, CandidateSignals, RelevanceScorer,
    DEFAULT_CONTEXT_LENGTH, DEFAULT_MAX_HIGHLIGHTS,
};
use gramdex_core::{Metadata, SearchConfig, SearchQuery, SearchResponse, SearchResult};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

// ============================================================================
// QueryPlan
// ============================================================================

/// One query term with its derived lookup grams
#[derive(Debug, Clone)]
pub struct TermGrams {
    /// The normalized term itself
    pub term: String,
    /// N-grams to look up in the n-gram index
    pub ngrams: Vec<String>,
    /// Edge-grams to look up in the edge-gram index
    pub edge_grams: Vec<String>,
}

/// Normalized query with per-term gram sets
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Lowercased, whitespace-split query terms (empty tokens dropped)
    pub terms: Vec<String>,
    /// Derived grams, one entry per term
    pub grams: Vec<TermGrams>,
}

impl QueryPlan {
    /// Build a plan from a raw query string
    ///
    /// Terms are the lowercased whitespace tokens of the raw query; each
    /// term's grams come from the same analyzer the indexing path uses.
    pub fn build(raw_query: &str, config: &SearchConfig) -> Self {
        let terms: Vec<String> = raw_query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        let grams = terms
            .iter()
            .map(|term| TermGrams {
                term: term.clone(),
                ngrams: build_ngrams(term, config.ngram_size),
                edge_grams: build_edge_grams(term, config.min_edgegram, config.max_edgegram),
            })
            .collect();

        QueryPlan { terms, grams }
    }

    /// Whether normalization left no terms to search for
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// ============================================================================
// CandidateAccumulator
// ============================================================================

/// Accumulates per-candidate gram signals while walking posting lists
///
/// A document appearing under multiple grams accumulates contributions
/// additively across all of them and across all query terms.
#[derive(Debug, Default)]
pub struct CandidateAccumulator {
    signals: HashMap<String, CandidateSignals>,
    max_edgegram: usize,
}

impl CandidateAccumulator {
    /// Create an accumulator for the given configuration
    pub fn new(config: &SearchConfig) -> Self {
        CandidateAccumulator {
            signals: HashMap::new(),
            max_edgegram: config.max_edgegram,
        }
    }

    /// Record every id in one n-gram posting set
    pub fn record_ngram_postings<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.signals.entry(id.to_string()).or_default().record_ngram_hit();
        }
    }

    /// Record every id in one edge-gram posting set
    ///
    /// `gram_len` is the character length of the matched edge-gram; longer
    /// prefixes contribute proportionally more.
    pub fn record_edge_postings<'a>(
        &mut self,
        gram_len: usize,
        ids: impl IntoIterator<Item = &'a str>,
    ) {
        for id in ids {
            self.signals
                .entry(id.to_string())
                .or_default()
                .record_edge_hit(gram_len, self.max_edgegram);
        }
    }

    /// Ids of every candidate touched so far, in ascending order
    ///
    /// Sorted so that backends fetch documents in a deterministic order.
    pub fn candidate_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.signals.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Accumulated signals for one candidate
    pub fn signals_for(&self, id: &str) -> CandidateSignals {
        self.signals.get(id).copied().unwrap_or_default()
    }

    /// Whether any posting hit was recorded
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

// ============================================================================
// Finalization
// ============================================================================

/// A candidate document fetched from backend storage
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Document id
    pub id: String,
    /// Stored content
    pub content: String,
    /// Stored metadata, absent when missing or undecodable
    pub metadata: Option<Metadata>,
}

/// Filter, score, order, paginate, and highlight fetched candidates
///
/// Candidates whose metadata fails any filter are excluded before scoring;
/// candidates scoring below `min_score` are dropped. Remaining candidates
/// sort by descending score with ascending id as the tie-breaker, so the
/// ranking is deterministic for a given input. `total` counts matches
/// before pagination and `has_more` is `offset + limit < total`.
pub fn finalize(
    query: &SearchQuery,
    plan: &QueryPlan,
    accumulator: &CandidateAccumulator,
    documents: Vec<FetchedDocument>,
    config: &SearchConfig,
    started: Instant,
) -> SearchResponse {
    let scorer = RelevanceScorer::new(config.clone());

    let mut scored: Vec<(f64, FetchedDocument)> = documents
        .into_iter()
        .filter(|doc| matches_filters(doc.metadata.as_ref(), query.filters.as_ref()))
        .map(|doc| {
            let signals = accumulator.signals_for(&doc.id);
            let score = scorer.score(&doc.content, &plan.terms, &signals);
            (score, doc)
        })
        .filter(|(score, _)| *score >= config.min_score)
        .collect();

    scored.sort_by(|(score_a, doc_a), (score_b, doc_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| doc_a.id.cmp(&doc_b.id))
    });

    let total = scored.len();
    let has_more = query.offset + query.limit < total;

    let results: Vec<SearchResult> = scored
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .map(|(score, doc)| {
            let highlights = generate_highlights(
                &doc.content,
                &plan.terms,
                DEFAULT_MAX_HIGHLIGHTS,
                DEFAULT_CONTEXT_LENGTH,
            );
            SearchResult {
                data: merged_data(&doc),
                id: doc.id,
                score,
                highlights,
            }
        })
        .collect();

    SearchResponse {
        query: query.query.clone(),
        results,
        total,
        took_ms: started.elapsed().as_millis() as u64,
        has_more,
    }
}

/// Merge metadata fields and content into the result's data view
fn merged_data(doc: &FetchedDocument) -> Metadata {
    let mut data = doc.metadata.clone().unwrap_or_default();
    data.insert("content".to_string(), Value::String(doc.content.clone()));
    data
}

/// Every filter key must equal the corresponding metadata field
fn matches_filters(metadata: Option<&Metadata>, filters: Option<&Metadata>) -> bool {
    let Some(filters) = filters else {
        return true;
    };
    if filters.is_empty() {
        return true;
    }
    let Some(metadata) = metadata else {
        return false;
    };
    filters
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> SearchConfig {
        SearchConfig::default()
    }

    fn fetched(id: &str, content: &str) -> FetchedDocument {
        FetchedDocument {
            id: id.to_string(),
            content: content.to_string(),
            metadata: None,
        }
    }

    #[test]
    fn test_plan_normalizes_terms() {
        let plan = QueryPlan::build("  Hello   WORLD  ", &config());
        assert_eq!(plan.terms, vec!["hello", "world"]);
        assert_eq!(plan.grams.len(), 2);
    }

    #[test]
    fn test_plan_empty_and_whitespace_queries() {
        assert!(QueryPlan::build("", &config()).is_empty());
        assert!(QueryPlan::build("   \t ", &config()).is_empty());
    }

    #[test]
    fn test_plan_derives_grams_per_term() {
        let plan = QueryPlan::build("cats", &config());
        assert_eq!(plan.grams[0].ngrams, vec!["cat", "ats"]);
        assert_eq!(plan.grams[0].edge_grams, vec!["ca", "cat", "cats"]);
    }

    #[test]
    fn test_accumulator_additive_across_grams() {
        let cfg = config();
        let mut acc = CandidateAccumulator::new(&cfg);
        acc.record_ngram_postings(["a", "b"]);
        acc.record_ngram_postings(["a"]);
        acc.record_edge_postings(5, ["a"]);

        let a = acc.signals_for("a");
        assert_eq!(a.ngram_matches, 2);
        assert_eq!(a.edge_weight, 0.5);

        let b = acc.signals_for("b");
        assert_eq!(b.ngram_matches, 1);
        assert_eq!(b.edge_weight, 0.0);
    }

    #[test]
    fn test_accumulator_candidate_ids_sorted() {
        let cfg = config();
        let mut acc = CandidateAccumulator::new(&cfg);
        acc.record_ngram_postings(["zeta", "alpha", "mid"]);
        assert_eq!(acc.candidate_ids(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_finalize_orders_by_score_then_id() {
        let cfg = config();
        let query = SearchQuery::new("rust");
        let plan = QueryPlan::build("rust", &cfg);
        let mut acc = CandidateAccumulator::new(&cfg);
        // Equal signals for both; exact boost applies to both; id breaks the tie
        acc.record_ngram_postings(["b", "a"]);

        let response = finalize(
            &query,
            &plan,
            &acc,
            vec![fetched("b", "rust"), fetched("a", "rust")],
            &cfg,
            Instant::now(),
        );

        let ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_finalize_drops_below_min_score() {
        let cfg = SearchConfig {
            min_score: 1.0,
            ..config()
        };
        let query = SearchQuery::new("rus");
        let plan = QueryPlan::build("rus", &cfg);
        let mut acc = CandidateAccumulator::new(&cfg);
        // One n-gram hit scores 0.5, below the 1.0 floor
        acc.record_ngram_postings(["a"]);

        let response = finalize(
            &query,
            &plan,
            &acc,
            vec![fetched("a", "rusty nail")],
            &cfg,
            Instant::now(),
        );
        assert!(response.results.is_empty());
        assert_eq!(response.total, 0);
    }

    #[test]
    fn test_finalize_pagination_counts() {
        let cfg = config();
        let query = SearchQuery::new("rust").with_limit(2).with_offset(1);
        let plan = QueryPlan::build("rust", &cfg);
        let mut acc = CandidateAccumulator::new(&cfg);
        acc.record_ngram_postings(["a", "b", "c", "d"]);

        let docs = vec![
            fetched("a", "rust"),
            fetched("b", "rust"),
            fetched("c", "rust"),
            fetched("d", "rust"),
        ];
        let response = finalize(&query, &plan, &acc, docs, &cfg, Instant::now());

        assert_eq!(response.total, 4);
        assert_eq!(response.results.len(), 2);
        assert!(response.has_more); // 1 + 2 < 4
        let ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_finalize_filters_exclude_before_scoring() {
        let cfg = config();
        let mut filters = Metadata::new();
        filters.insert("lang".to_string(), json!("en"));
        let query = SearchQuery::new("rust").with_filters(filters);
        let plan = QueryPlan::build("rust", &cfg);
        let mut acc = CandidateAccumulator::new(&cfg);
        acc.record_ngram_postings(["en-doc", "de-doc", "bare-doc"]);

        let mut en_meta = Metadata::new();
        en_meta.insert("lang".to_string(), json!("en"));
        let mut de_meta = Metadata::new();
        de_meta.insert("lang".to_string(), json!("de"));

        let docs = vec![
            FetchedDocument {
                id: "en-doc".to_string(),
                content: "rust".to_string(),
                metadata: Some(en_meta),
            },
            FetchedDocument {
                id: "de-doc".to_string(),
                content: "rust".to_string(),
                metadata: Some(de_meta),
            },
            fetched("bare-doc", "rust"),
        ];
        let response = finalize(&query, &plan, &acc, docs, &cfg, Instant::now());

        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].id, "en-doc");
    }

    #[test]
    fn test_finalize_merges_content_into_data() {
        let cfg = config();
        let query = SearchQuery::new("rust");
        let plan = QueryPlan::build("rust", &cfg);
        let mut acc = CandidateAccumulator::new(&cfg);
        acc.record_ngram_postings(["a"]);

        let mut meta = Metadata::new();
        meta.insert("author".to_string(), json!("alice"));
        let docs = vec![FetchedDocument {
            id: "a".to_string(),
            content: "rust".to_string(),
            metadata: Some(meta),
        }];
        let response = finalize(&query, &plan, &acc, docs, &cfg, Instant::now());

        let data = &response.results[0].data;
        assert_eq!(data.get("author"), Some(&json!("alice")));
        assert_eq!(data.get("content"), Some(&json!("rust")));
    }

    #[test]
    fn test_finalize_attaches_highlights() {
        let cfg = config();
        let query = SearchQuery::new("rust");
        let plan = QueryPlan::build("rust", &cfg);
        let mut acc = CandidateAccumulator::new(&cfg);
        acc.record_ngram_postings(["a"]);

        let response = finalize(
            &query,
            &plan,
            &acc,
            vec![fetched("a", "Rust is fast")],
            &cfg,
            Instant::now(),
        );
        assert_eq!(response.results[0].highlights, vec!["<mark>Rust</mark> is fast"]);
    }

    #[test]
    fn test_matches_filters_cases() {
        let mut meta = Metadata::new();
        meta.insert("k".to_string(), json!("v"));
        let mut filters = Metadata::new();
        filters.insert("k".to_string(), json!("v"));

        assert!(matches_filters(Some(&meta), None));
        assert!(matches_filters(None, None));
        assert!(matches_filters(Some(&meta), Some(&filters)));
        assert!(matches_filters(Some(&meta), Some(&Metadata::new())));
        assert!(!matches_filters(None, Some(&filters)));

        let mut wrong = Metadata::new();
        wrong.insert("k".to_string(), json!("other"));
        assert!(!matches_filters(Some(&wrong), Some(&filters)));
    }
}
