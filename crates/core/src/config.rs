//! Search scoring and gram-generation configuration
//!
//! `SearchConfig` carries the analyzer and scorer knobs. Every field has a
//! serde default so partial configuration files deserialize cleanly.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Analyzer and scoring configuration
///
/// # Degenerate configurations
///
/// `min_edgegram > max_edgegram` is accepted: edge-gram generation simply
/// yields nothing. Only `ngram_size == 0` is rejected by [`validate`].
///
/// [`validate`]: SearchConfig::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Length of fuzzy-match n-grams
    #[serde(default = "default_ngram_size")]
    pub ngram_size: usize,

    /// Shortest prefix emitted by edge-gram generation
    #[serde(default = "default_min_edgegram")]
    pub min_edgegram: usize,

    /// Longest prefix emitted by edge-gram generation
    ///
    /// Also the denominator for length-weighting edge-gram matches: a
    /// matched prefix of length L contributes `L / max_edgegram` before
    /// `edgegram_weight` is applied.
    #[serde(default = "default_max_edgegram")]
    pub max_edgegram: usize,

    /// Score added once per query term found verbatim in the document
    #[serde(default = "default_exact_match_boost")]
    pub exact_match_boost: f64,

    /// Weight of each n-gram posting hit
    #[serde(default = "default_ngram_weight")]
    pub ngram_weight: f64,

    /// Weight of the length-scaled edge-gram signal
    #[serde(default = "default_edgegram_weight")]
    pub edgegram_weight: f64,

    /// Candidates scoring below this are dropped from results
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

fn default_ngram_size() -> usize {
    3
}

fn default_min_edgegram() -> usize {
    2
}

fn default_max_edgegram() -> usize {
    10
}

fn default_exact_match_boost() -> f64 {
    100.0
}

fn default_ngram_weight() -> f64 {
    0.5
}

fn default_edgegram_weight() -> f64 {
    1.0
}

fn default_min_score() -> f64 {
    0.1
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            ngram_size: default_ngram_size(),
            min_edgegram: default_min_edgegram(),
            max_edgegram: default_max_edgegram(),
            exact_match_boost: default_exact_match_boost(),
            ngram_weight: default_ngram_weight(),
            edgegram_weight: default_edgegram_weight(),
            min_score: default_min_score(),
        }
    }
}

impl SearchConfig {
    /// Check the configuration for values the engine cannot operate with
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `ngram_size` is zero or
    /// `max_edgegram` is zero (the edge-gram length weighting divides by it).
    pub fn validate(&self) -> Result<()> {
        if self.ngram_size == 0 {
            return Err(Error::InvalidConfig(
                "ngram_size must be at least 1".to_string(),
            ));
        }
        if self.max_edgegram == 0 {
            return Err(Error::InvalidConfig(
                "max_edgegram must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
