//! Core types for search operations
//!
//! This module defines the foundational types used throughout the system:
//! - Document: the unit of indexing
//! - SearchQuery: universal query type for all backends
//! - SearchResult / SearchResponse: ranked, paginated output
//! - SessionRecord: opaque TTL'd session bookkeeping record
//! - IndexStats: backend observability counters
//!
//! The same `SearchQuery` and `SearchResponse` types are used by every
//! backend. This invariant must not change.

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema-free metadata attached to documents and sessions
///
/// Represented as an opaque key/value structure at the storage boundary.
/// Backends decode stored metadata defensively: an undecodable payload is
/// treated as absent metadata, never as a search failure.
pub type Metadata = serde_json::Map<String, Value>;

// ============================================================================
// Document
// ============================================================================

/// A document held by an index storage backend
///
/// Created on index, overwritten on re-index of the same id, destroyed on
/// removal or eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id
    pub id: String,
    /// Searchable text content
    pub content: String,
    /// Optional schema-free metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Document {
    /// Create a document without metadata
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Document {
            id: id.into(),
            content: content.into(),
            metadata: None,
        }
    }

    /// Builder: attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ============================================================================
// SearchQuery
// ============================================================================

/// Request for a search against any backend
///
/// # Examples
///
/// ```
/// use gramdex_core::SearchQuery;
///
/// let query = SearchQuery::new("typescript tutorial")
///     .with_limit(20)
///     .with_offset(40);
///
/// assert_eq!(query.query, "typescript tutorial");
/// assert_eq!(query.limit, 20);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Raw query string (normalized by the engine)
    pub query: String,

    /// Maximum results per page
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Number of ranked results to skip
    #[serde(default)]
    pub offset: usize,

    /// Optional metadata equality filters
    ///
    /// A candidate is kept only if every filter key equals the corresponding
    /// field in the document's metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Metadata>,
}

fn default_limit() -> usize {
    10
}

impl SearchQuery {
    /// Create a query with default pagination (limit 10, offset 0)
    pub fn new(query: impl Into<String>) -> Self {
        SearchQuery {
            query: query.into(),
            limit: default_limit(),
            offset: 0,
            filters: None,
        }
    }

    /// Builder: set the page size
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Builder: set the pagination offset
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Builder: set metadata equality filters
    pub fn with_filters(mut self, filters: Metadata) -> Self {
        self.filters = Some(filters);
        self
    }
}

// ============================================================================
// SearchResult / SearchResponse
// ============================================================================

/// A single ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document id
    pub id: String,
    /// Relevance score (always >= 0)
    pub score: f64,
    /// Merged view of the document: metadata fields plus `content`
    pub data: Metadata,
    /// Highlighted snippets, in match order
    pub highlights: Vec<String>,
}

/// Response from a search operation
///
/// Results are ordered by descending score; ties are broken by ascending
/// document id so that ordering is deterministic for a given input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The raw query string as submitted
    pub query: String,
    /// Ranked results for the requested page
    pub results: Vec<SearchResult>,
    /// Number of matches before pagination
    pub total: usize,
    /// Elapsed wall-clock milliseconds
    pub took_ms: u64,
    /// Whether further pages exist (`offset + limit < total`)
    pub has_more: bool,
}

impl SearchResponse {
    /// An empty response for a query that matches nothing
    pub fn empty(query: impl Into<String>, took_ms: u64) -> Self {
        SearchResponse {
            query: query.into(),
            results: vec![],
            total: 0,
            took_ms,
            has_more: false,
        }
    }
}

// ============================================================================
// SessionRecord
// ============================================================================

/// Opaque session bookkeeping record with a time-to-live
///
/// Sessions are owned by the connection layer; the backends store and
/// expire them but never interpret `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session id assigned by the connection layer
    pub session_id: String,
    /// Opaque session payload
    #[serde(default)]
    pub data: Metadata,
    /// When the session was first stored
    pub connected_at: Timestamp,
    /// Last heartbeat, refreshed by `update_last_seen`
    pub last_seen: Timestamp,
}

impl SessionRecord {
    /// Create a record stamped with the current time
    pub fn new(session_id: impl Into<String>, data: Metadata) -> Self {
        let now = Timestamp::now();
        SessionRecord {
            session_id: session_id.into(),
            data,
            connected_at: now,
            last_seen: now,
        }
    }
}

// ============================================================================
// IndexStats
// ============================================================================

/// Observability counters for a backend's index state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored documents
    pub documents: usize,
    /// Number of distinct n-grams with at least one posting
    pub ngrams: usize,
    /// Number of distinct edge-grams with at least one posting
    pub edgegrams: usize,
    /// Number of live sessions
    pub sessions: usize,
}
