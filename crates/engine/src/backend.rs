//! Storage backend capability trait
//!
//! This module defines the `SearchBackend` trait that abstracts over index
//! storage strategies. Each variant implements this trait:
//!
//! - **MemoryBackend**: documents and inverted indexes in process-local
//!   maps, LRU-bounded, no persistence
//! - **RemoteBackend**: equivalent semantics over a remote key-value store
//!   reached through pipelined primitive commands
//!
//! The search pipeline itself (gram derivation, scoring, pagination,
//! highlights) is shared in [`crate::query`]; backends contribute only
//! posting lookup and document storage.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`; every operation is async because
//! the remote variant performs network I/O.

use async_trait::async_trait;
use gramdex_core::{IndexStats, Metadata, Result, SearchQuery, SearchResponse, SessionRecord};

/// Capability interface over index storage backends
///
/// # Contract
///
/// - `index_document` is an idempotent upsert: all postings from a prior
///   indexing of the same id are retracted before the new content's
///   postings are written, so stale grams never linger.
/// - `remove_document` retracts every posting for the id and deletes the
///   stored content; removing an unknown id is a no-op.
/// - `search` runs the shared pipeline against this backend's storage. An
///   empty-after-normalization query returns an empty response without
///   touching posting storage.
/// - Session operations store opaque TTL'd records for the connection
///   layer; they are bundled here because the backend owns their storage.
/// - Operations after `disconnect` are undefined.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Index (or re-index) a document
    async fn index_document(
        &self,
        id: &str,
        content: &str,
        metadata: Option<Metadata>,
    ) -> Result<()>;

    /// Remove a document and all of its postings
    async fn remove_document(&self, id: &str) -> Result<()>;

    /// Execute a search against this backend's storage
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse>;

    /// Store a session record under the backend's session TTL
    async fn set_session(&self, session_id: &str, data: Metadata) -> Result<()>;

    /// Fetch a live session record, `None` if unknown or expired
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Delete a session record; unknown ids are a no-op
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Enumerate all live session records
    async fn all_sessions(&self) -> Result<Vec<SessionRecord>>;

    /// Refresh a session's heartbeat timestamp and TTL; no-op if unknown
    async fn update_last_seen(&self, session_id: &str) -> Result<()>;

    /// Garbage-collect expired or dangling entries
    async fn cleanup(&self) -> Result<()>;

    /// Release backend resources
    async fn disconnect(&self) -> Result<()>;

    /// Observability counters for the current index state
    async fn stats(&self) -> Result<IndexStats>;
}
