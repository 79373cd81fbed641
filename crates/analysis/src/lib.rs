//! Text analysis and relevance scoring for gramdex
//!
//! This crate provides the pure, stateless half of the search engine:
//! - `analyzer`: normalization, n-gram and edge-gram generation
//! - `highlight`: context-window snippet extraction with `<mark>` wrapping
//! - `scorer`: `RelevanceScorer` combining exact-word, n-gram, and
//!   edge-gram signals under configurable weights
//!
//! Nothing here touches storage; the engine crate feeds these functions
//! from whichever backend is in use.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod highlight;
pub mod scorer;

pub use analyzer::{build_edge_grams, build_ngrams, normalize, words};
pub use highlight::{generate_highlights, DEFAULT_CONTEXT_LENGTH, DEFAULT_MAX_HIGHLIGHTS};
pub use scorer::{CandidateSignals, RelevanceScorer};
