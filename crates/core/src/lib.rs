//! Core types for the gramdex search engine
//!
//! This crate provides:
//! - The error taxonomy (`Error`, `Result`)
//! - Document, query, response, and session types shared by every backend
//! - `SearchConfig` scoring/analysis knobs
//! - The microsecond `Timestamp` newtype
//!
//! It holds no engine logic; the analysis and engine crates build on it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod timestamp;
pub mod types;

pub use config::SearchConfig;
pub use error::{Error, Result};
pub use timestamp::Timestamp;
pub use types::{
    Document, IndexStats, Metadata, SearchQuery, SearchResponse, SearchResult, SessionRecord,
};
