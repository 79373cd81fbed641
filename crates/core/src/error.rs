//! Error types for the gramdex search engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Engine-internal inconsistencies (stale postings, undecodable metadata) are
//! never represented here: those are recovered locally by the backends. Only
//! true unavailability of the storage backend propagates as an error.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for gramdex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the gramdex search engine
#[derive(Debug, Error)]
pub enum Error {
    /// The storage backend could not be reached or answered with a failure.
    ///
    /// Distinct from an empty search result: this is not evidence of
    /// "no matches".
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A search against a remote backend exceeded its overall time budget
    #[error("search timed out after {0:?}")]
    SearchTimeout(Duration),

    /// Serialization/deserialization error on a write path
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
