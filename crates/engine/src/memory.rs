//! In-memory index storage backend
//!
//! Documents and both inverted indexes live in process-local maps behind a
//! single `RwLock`, which gives every document-level operation the
//! run-to-completion property: posting retraction always finishes before
//! new postings are written.
//!
//! The backend is bounded: indexing a new document beyond `max_documents`
//! evicts the least-recently-used document first. Recency is an explicit
//! `id -> last-access tick` table driven by a monotonic counter, bumped on
//! index and on every document returned by a search. Eviction fully
//! retracts the victim's postings.
//!
//! Sessions live in a `DashMap` with a [`TtlIndex`] feeding `cleanup`.

use crate::backend::SearchBackend;
use crate::config::MemorySettings;
use crate::query::{CandidateAccumulator, FetchedDocument, QueryPlan};
use crate::{query, ttl::TtlIndex};
use async_trait::async_trait;
use dashmap::DashMap;
use gramdex_core::{
    IndexStats, Metadata, Result, SearchConfig, SearchQuery, SearchResponse, SessionRecord,
    Timestamp,
};
use gramdex_analysis::{build_edge_grams, build_ngrams};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// A stored document plus its LRU bookkeeping
#[derive(Debug, Clone)]
struct StoredDocument {
    content: String,
    metadata: Option<Metadata>,
}

/// Index state guarded by one lock
#[derive(Debug, Default)]
struct IndexState {
    documents: FxHashMap<String, StoredDocument>,
    ngram_index: FxHashMap<String, HashSet<String>>,
    edgegram_index: FxHashMap<String, HashSet<String>>,
    /// id -> last-access tick; the eviction order is this table, not map
    /// iteration order
    access: FxHashMap<String, u64>,
    access_clock: u64,
}

impl IndexState {
    fn touch(&mut self, id: &str) {
        self.access_clock += 1;
        let tick = self.access_clock;
        self.access.insert(id.to_string(), tick);
    }
}

/// A stored session plus its expiry
#[derive(Debug, Clone)]
struct StoredSession {
    record: SessionRecord,
    expires_at: Timestamp,
}

/// In-memory search backend with LRU-bounded document storage
pub struct MemoryBackend {
    search_config: SearchConfig,
    settings: MemorySettings,
    state: RwLock<IndexState>,
    sessions: DashMap<String, StoredSession>,
    session_ttl: Mutex<TtlIndex>,
}

impl MemoryBackend {
    /// Create a backend with default capacity and session TTL
    pub fn new(search_config: SearchConfig) -> Self {
        Self::with_settings(search_config, MemorySettings::default())
    }

    /// Create a backend with explicit settings
    pub fn with_settings(search_config: SearchConfig, settings: MemorySettings) -> Self {
        MemoryBackend {
            search_config,
            settings,
            state: RwLock::new(IndexState::default()),
            sessions: DashMap::new(),
            session_ttl: Mutex::new(TtlIndex::new()),
        }
    }

    /// Builder: cap the number of stored documents
    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.settings.max_documents = max_documents;
        self
    }

    /// Number of stored documents
    pub fn document_count(&self) -> usize {
        self.state.read().documents.len()
    }

    /// Retract every posting the document's current content implies
    ///
    /// Grams are recomputed from the stored content, which by the index
    /// invariant is exactly the set the document was indexed under.
    fn retract_postings(&self, state: &mut IndexState, id: &str) {
        let Some(doc) = state.documents.get(id) else {
            return;
        };
        let ngrams = build_ngrams(&doc.content, self.search_config.ngram_size);
        let edges = build_edge_grams(
            &doc.content,
            self.search_config.min_edgegram,
            self.search_config.max_edgegram,
        );

        for gram in ngrams {
            if let Some(ids) = state.ngram_index.get_mut(&gram) {
                ids.remove(id);
                if ids.is_empty() {
                    state.ngram_index.remove(&gram);
                }
            }
        }
        for gram in edges {
            if let Some(ids) = state.edgegram_index.get_mut(&gram) {
                ids.remove(id);
                if ids.is_empty() {
                    state.edgegram_index.remove(&gram);
                }
            }
        }
    }

    /// Evict the least-recently-used document, postings included
    fn evict_lru(&self, state: &mut IndexState) {
        // Lowest tick wins; id breaks ties so eviction is deterministic
        let victim = state
            .access
            .iter()
            .min_by(|(id_a, tick_a), (id_b, tick_b)| tick_a.cmp(tick_b).then(id_a.cmp(id_b)))
            .map(|(id, _)| id.clone());

        if let Some(id) = victim {
            self.retract_postings(state, &id);
            state.documents.remove(&id);
            state.access.remove(&id);
            debug!(target: "gramdex::memory", id = %id, "evicted least-recently-used document");
        }
    }

    fn live_session(&self, session_id: &str, now: Timestamp) -> Option<SessionRecord> {
        let entry = self.sessions.get(session_id)?;
        if entry.expires_at <= now {
            return None;
        }
        Some(entry.record.clone())
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn index_document(
        &self,
        id: &str,
        content: &str,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        let mut state = self.state.write();

        let replacing = state.documents.contains_key(id);
        if replacing {
            self.retract_postings(&mut state, id);
        } else if self.settings.max_documents > 0
            && state.documents.len() >= self.settings.max_documents
        {
            self.evict_lru(&mut state);
        }

        let ngrams = build_ngrams(content, self.search_config.ngram_size);
        let edges = build_edge_grams(
            content,
            self.search_config.min_edgegram,
            self.search_config.max_edgegram,
        );

        for gram in ngrams {
            state
                .ngram_index
                .entry(gram)
                .or_default()
                .insert(id.to_string());
        }
        for gram in edges {
            state
                .edgegram_index
                .entry(gram)
                .or_default()
                .insert(id.to_string());
        }

        state.documents.insert(
            id.to_string(),
            StoredDocument {
                content: content.to_string(),
                metadata,
            },
        );
        state.touch(id);

        debug!(target: "gramdex::memory", id, replacing, "indexed document");
        Ok(())
    }

    async fn remove_document(&self, id: &str) -> Result<()> {
        let mut state = self.state.write();
        self.retract_postings(&mut state, id);
        let existed = state.documents.remove(id).is_some();
        state.access.remove(id);
        if existed {
            debug!(target: "gramdex::memory", id, "removed document");
        }
        Ok(())
    }

    async fn search(&self, search_query: &SearchQuery) -> Result<SearchResponse> {
        let started = Instant::now();
        let plan = QueryPlan::build(&search_query.query, &self.search_config);
        if plan.is_empty() {
            // Empty or whitespace-only query: nothing to match, and the
            // posting storage is never touched.
            return Ok(SearchResponse::empty(
                search_query.query.clone(),
                started.elapsed().as_millis() as u64,
            ));
        }

        let mut state = self.state.write();
        let mut accumulator = CandidateAccumulator::new(&self.search_config);

        for term in &plan.grams {
            for gram in &term.ngrams {
                if let Some(ids) = state.ngram_index.get(gram) {
                    accumulator.record_ngram_postings(ids.iter().map(String::as_str));
                }
            }
            for gram in &term.edge_grams {
                if let Some(ids) = state.edgegram_index.get(gram) {
                    accumulator
                        .record_edge_postings(gram.chars().count(), ids.iter().map(String::as_str));
                }
            }
        }

        let mut documents = Vec::new();
        for id in accumulator.candidate_ids() {
            // A candidate with no document record would be a stale posting;
            // retraction is atomic under the lock here, but the shared flow
            // drops such candidates silently either way.
            if let Some(doc) = state.documents.get(&id) {
                documents.push(FetchedDocument {
                    id,
                    content: doc.content.clone(),
                    metadata: doc.metadata.clone(),
                });
            }
        }

        let response = query::finalize(
            search_query,
            &plan,
            &accumulator,
            documents,
            &self.search_config,
            started,
        );

        // Returned documents count as hits for LRU purposes
        for result in &response.results {
            state.touch(&result.id);
        }

        Ok(response)
    }

    async fn set_session(&self, session_id: &str, data: Metadata) -> Result<()> {
        let record = SessionRecord::new(session_id, data);
        let expires_at = record.last_seen.saturating_add(self.settings.session_ttl());

        let mut ttl = self.session_ttl.lock();
        if let Some(previous) = self.sessions.insert(
            session_id.to_string(),
            StoredSession { record, expires_at },
        ) {
            ttl.remove(previous.expires_at, session_id);
        }
        ttl.insert(expires_at, session_id);
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.live_session(session_id, Timestamp::now()))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        if let Some((_, stored)) = self.sessions.remove(session_id) {
            self.session_ttl.lock().remove(stored.expires_at, session_id);
        }
        Ok(())
    }

    async fn all_sessions(&self) -> Result<Vec<SessionRecord>> {
        let now = Timestamp::now();
        let mut records: Vec<SessionRecord> = self
            .sessions
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.record.clone())
            .collect();
        records.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(records)
    }

    async fn update_last_seen(&self, session_id: &str) -> Result<()> {
        let now = Timestamp::now();
        let mut ttl = self.session_ttl.lock();
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            if entry.expires_at <= now {
                return Ok(());
            }
            let previous_expiry = entry.expires_at;
            entry.record.last_seen = now;
            entry.expires_at = now.saturating_add(self.settings.session_ttl());
            let refreshed = entry.expires_at;
            drop(entry);
            ttl.remove(previous_expiry, session_id);
            ttl.insert(refreshed, session_id);
        }
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        let now = Timestamp::now();
        let mut ttl = self.session_ttl.lock();

        let mut removed = 0usize;
        for session_id in ttl.find_expired(now) {
            // The record may have been refreshed since it was registered
            // under this expiry bucket; only drop sessions that really are
            // past their TTL.
            let expired = self
                .sessions
                .get(&session_id)
                .map(|entry| entry.expires_at <= now)
                .unwrap_or(false);
            if expired {
                self.sessions.remove(&session_id);
                removed += 1;
            }
        }
        ttl.remove_expired(now);

        if removed > 0 {
            debug!(target: "gramdex::memory", removed, "cleaned up expired sessions");
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.write();
        state.documents.clear();
        state.ngram_index.clear();
        state.edgegram_index.clear();
        state.access.clear();
        self.sessions.clear();
        *self.session_ttl.lock() = TtlIndex::new();
        info!(target: "gramdex::memory", "backend disconnected");
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let now = Timestamp::now();
        let state = self.state.read();
        Ok(IndexStats {
            documents: state.documents.len(),
            ngrams: state.ngram_index.len(),
            edgegrams: state.edgegram_index.len(),
            sessions: self
                .sessions
                .iter()
                .filter(|entry| entry.expires_at > now)
                .count(),
        })
    }
}
