//! gramdex - typo-tolerant fuzzy search with pluggable storage backends
//!
//! gramdex indexes documents into two inverted indexes - character n-grams
//! for fuzzy matching and edge-grams (word prefixes) for typeahead-style
//! matching - and runs one scoring, pagination, and highlight pipeline
//! against either an in-memory backend or a remote key-value store.
//!
//! # Quick Start
//!
//! ```
//! use gramdex::{MemoryBackend, SearchBackend, SearchConfig, SearchQuery};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> gramdex::Result<()> {
//! let backend = MemoryBackend::new(SearchConfig::default());
//!
//! backend.index_document("a", "TypeScript is amazing", None).await?;
//! backend.index_document("b", "WebSockets enable real-time communication", None).await?;
//!
//! let response = backend.search(&SearchQuery::new("typescript")).await?;
//! assert_eq!(response.results[0].id, "a");
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! Analysis (n-grams, edge-grams, highlights, scoring) is pure and lives in
//! `gramdex-analysis`; backends implement the [`SearchBackend`] capability
//! trait and share the query pipeline from `gramdex-engine`. The remote
//! backend talks to its store exclusively through the [`KvClient`] command
//! trait, so a binary-protocol connection and an HTTP client are
//! interchangeable transports.

pub use gramdex_core::{
    Document, Error, IndexStats, Metadata, Result, SearchConfig, SearchQuery, SearchResponse,
    SearchResult, SessionRecord, Timestamp,
};

pub use gramdex_engine::{
    EngineConfig, InProcessKv, KvClient, KvCommand, KvReply, MemoryBackend, MemorySettings,
    RemoteBackend, RemoteSettings, SearchBackend, CONFIG_FILE_NAME,
};

pub use gramdex_analysis::{
    build_edge_grams, build_ngrams, generate_highlights, normalize, RelevanceScorer,
};
