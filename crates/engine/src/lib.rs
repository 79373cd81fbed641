//! Search engine backends for gramdex
//!
//! This crate provides:
//! - `SearchBackend`: the async capability trait every backend implements
//! - `MemoryBackend`: process-local maps with LRU-bounded capacity
//! - `RemoteBackend<C>`: the same semantics over a pipelined key-value
//!   store client (`KvClient`), with `InProcessKv` as the in-process
//!   reference transport
//! - `query`: the shared search flow (gram derivation, candidate
//!   accumulation, scoring, pagination, highlights)
//! - `EngineConfig`: TOML file configuration
//!
//! # Usage
//!
//! ```
//! use gramdex_core::{SearchConfig, SearchQuery};
//! use gramdex_engine::{MemoryBackend, SearchBackend};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> gramdex_core::Result<()> {
//! let backend = MemoryBackend::new(SearchConfig::default());
//! backend.index_document("a", "TypeScript is amazing", None).await?;
//!
//! let response = backend.search(&SearchQuery::new("typescript")).await?;
//! assert_eq!(response.results[0].id, "a");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod kv;
pub mod memory;
pub mod query;
pub mod remote;
pub mod ttl;

pub use backend::SearchBackend;
pub use config::{EngineConfig, MemorySettings, RemoteSettings, CONFIG_FILE_NAME};
pub use kv::{InProcessKv, KvClient, KvCommand, KvReply};
pub use memory::MemoryBackend;
pub use remote::RemoteBackend;
