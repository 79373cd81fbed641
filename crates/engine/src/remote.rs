//! Remote key-value-store index backend
//!
//! Implements the same index semantics as the in-memory backend through
//! pipelined [`KvCommand`] batches against any [`KvClient`] transport.
//!
//! # Key layout
//!
//! Every category gets its own namespace under the configured prefix so
//! prefix enumeration never crosses categories:
//!
//! ```text
//! {prefix}doc:{id}        hash: content, metadata (JSON), grams (JSON)
//! {prefix}ngram:{gram}    set of document ids
//! {prefix}edge:{gram}     set of document ids
//! {prefix}session:{id}    hash: data (JSON), connected_at, last_seen
//! {prefix}sessions        set of session ids
//! ```
//!
//! The `grams` field on the document hash lists every posting key the
//! document was indexed under, so retraction is a direct pipelined removal.
//! Records written before gram tracking existed fall back to enumerating
//! both posting namespaces by prefix.

use crate::backend::SearchBackend;
use crate::config::RemoteSettings;
use crate::kv::{KvClient, KvCommand, KvReply};
use crate::query::{CandidateAccumulator, FetchedDocument, QueryPlan};
use crate::query;
use async_trait::async_trait;
use gramdex_core::{
    Error, IndexStats, Metadata, Result, SearchConfig, SearchQuery, SearchResponse, SessionRecord,
    Timestamp,
};
use gramdex_analysis::{build_edge_grams, build_ngrams};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Index backend over a remote key-value store
pub struct RemoteBackend<C: KvClient> {
    client: C,
    search_config: SearchConfig,
    settings: RemoteSettings,
}

impl<C: KvClient> RemoteBackend<C> {
    /// Create a backend with default settings
    pub fn new(client: C, search_config: SearchConfig) -> Self {
        Self::with_settings(client, search_config, RemoteSettings::default())
    }

    /// Create a backend with explicit settings
    pub fn with_settings(client: C, search_config: SearchConfig, settings: RemoteSettings) -> Self {
        RemoteBackend {
            client,
            search_config,
            settings,
        }
    }

    /// The underlying client, mainly for tests
    pub fn client(&self) -> &C {
        &self.client
    }

    fn doc_key(&self, id: &str) -> String {
        format!("{}doc:{}", self.settings.key_prefix, id)
    }

    fn ngram_key(&self, gram: &str) -> String {
        format!("{}ngram:{}", self.settings.key_prefix, gram)
    }

    fn edge_key(&self, gram: &str) -> String {
        format!("{}edge:{}", self.settings.key_prefix, gram)
    }

    fn session_key(&self, session_id: &str) -> String {
        format!("{}session:{}", self.settings.key_prefix, session_id)
    }

    fn sessions_set_key(&self) -> String {
        format!("{}sessions", self.settings.key_prefix)
    }

    /// Every posting key the given content implies, n-grams first
    fn posting_keys(&self, content: &str) -> Vec<String> {
        let ngrams = build_ngrams(content, self.search_config.ngram_size);
        let edges = build_edge_grams(
            content,
            self.search_config.min_edgegram,
            self.search_config.max_edgegram,
        );
        ngrams
            .iter()
            .map(|g| self.ngram_key(g))
            .chain(edges.iter().map(|g| self.edge_key(g)))
            .collect()
    }

    /// Retract every posting for `id`, returning whether the record existed
    async fn retract_postings(&self, id: &str) -> Result<bool> {
        let fields = self
            .client
            .execute(KvCommand::HashGetAll {
                key: self.doc_key(id),
            })
            .await?
            .into_fields()?;
        if fields.is_empty() {
            return Ok(false);
        }

        let posting_keys = match fields.get("grams") {
            Some(raw) => match serde_json::from_str::<Vec<String>>(raw) {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(
                        target: "gramdex::remote",
                        id, error = %e,
                        "undecodable gram tracking, falling back to posting scan"
                    );
                    self.scan_posting_keys().await?
                }
            },
            None => {
                warn!(
                    target: "gramdex::remote",
                    id, "record predates gram tracking, falling back to posting scan"
                );
                self.scan_posting_keys().await?
            }
        };

        if !posting_keys.is_empty() {
            let commands = posting_keys
                .into_iter()
                .map(|key| KvCommand::SetRemove {
                    key,
                    member: id.to_string(),
                })
                .collect();
            self.client.pipeline(commands).await?;
        }
        Ok(true)
    }

    /// Enumerate every posting key in both gram namespaces
    ///
    /// Reserved for records without gram tracking; a backend-wide scan.
    async fn scan_posting_keys(&self) -> Result<Vec<String>> {
        let replies = self
            .client
            .pipeline(vec![
                KvCommand::Keys {
                    pattern: format!("{}ngram:*", self.settings.key_prefix),
                },
                KvCommand::Keys {
                    pattern: format!("{}edge:*", self.settings.key_prefix),
                },
            ])
            .await?;

        let mut keys = Vec::new();
        for reply in replies {
            keys.extend(reply.into_members()?);
        }
        Ok(keys)
    }

    async fn search_inner(&self, search_query: &SearchQuery) -> Result<SearchResponse> {
        let started = Instant::now();
        let plan = QueryPlan::build(&search_query.query, &self.search_config);
        if plan.is_empty() {
            return Ok(SearchResponse::empty(
                search_query.query.clone(),
                started.elapsed().as_millis() as u64,
            ));
        }

        let mut accumulator = CandidateAccumulator::new(&self.search_config);

        // One round trip per term covering that term's whole gram set
        for term in &plan.grams {
            let mut commands = Vec::with_capacity(term.ngrams.len() + term.edge_grams.len());
            for gram in &term.ngrams {
                commands.push(KvCommand::SetMembers {
                    key: self.ngram_key(gram),
                });
            }
            for gram in &term.edge_grams {
                commands.push(KvCommand::SetMembers {
                    key: self.edge_key(gram),
                });
            }
            if commands.is_empty() {
                continue;
            }

            let replies = self.client.pipeline(commands).await?;
            let (ngram_replies, edge_replies) = replies.split_at(term.ngrams.len());

            for reply in ngram_replies {
                let ids = reply.clone().into_members()?;
                accumulator.record_ngram_postings(ids.iter().map(String::as_str));
            }
            for (gram, reply) in term.edge_grams.iter().zip(edge_replies) {
                let ids = reply.clone().into_members()?;
                accumulator.record_edge_postings(gram.chars().count(), ids.iter().map(String::as_str));
            }
        }

        // One round trip for every candidate document
        let candidate_ids = accumulator.candidate_ids();
        let mut documents = Vec::with_capacity(candidate_ids.len());
        if !candidate_ids.is_empty() {
            let commands = candidate_ids
                .iter()
                .map(|id| KvCommand::HashGetAll {
                    key: self.doc_key(id),
                })
                .collect();
            let replies = self.client.pipeline(commands).await?;

            for (id, reply) in candidate_ids.into_iter().zip(replies) {
                let fields = reply.into_fields()?;
                if fields.is_empty() {
                    // Stale posting referencing a deleted document
                    continue;
                }
                let Some(content) = fields.get("content") else {
                    warn!(target: "gramdex::remote", id = %id, "document record missing content");
                    continue;
                };
                let metadata = fields.get("metadata").and_then(|raw| {
                    match serde_json::from_str::<Metadata>(raw) {
                        Ok(metadata) => Some(metadata),
                        Err(e) => {
                            warn!(
                                target: "gramdex::remote",
                                id = %id, error = %e,
                                "undecodable metadata, treating as absent"
                            );
                            None
                        }
                    }
                });
                documents.push(FetchedDocument {
                    id,
                    content: content.clone(),
                    metadata,
                });
            }
        }

        Ok(query::finalize(
            search_query,
            &plan,
            &accumulator,
            documents,
            &self.search_config,
            started,
        ))
    }

    fn parse_session(&self, session_id: &str, fields: std::collections::HashMap<String, String>) -> SessionRecord {
        let data = fields
            .get("data")
            .and_then(|raw| match serde_json::from_str::<Metadata>(raw) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(
                        target: "gramdex::session",
                        session_id, error = %e,
                        "undecodable session data, treating as empty"
                    );
                    None
                }
            })
            .unwrap_or_default();
        let connected_at = parse_micros(fields.get("connected_at"));
        let last_seen = parse_micros(fields.get("last_seen"));
        SessionRecord {
            session_id: session_id.to_string(),
            data,
            connected_at,
            last_seen,
        }
    }
}

fn parse_micros(raw: Option<&String>) -> Timestamp {
    raw.and_then(|s| s.parse::<u64>().ok())
        .map(Timestamp::from_micros)
        .unwrap_or(Timestamp::EPOCH)
}

#[async_trait]
impl<C: KvClient> SearchBackend for RemoteBackend<C> {
    async fn index_document(
        &self,
        id: &str,
        content: &str,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        self.retract_postings(id).await?;

        let posting_keys = self.posting_keys(content);

        let mut fields = vec![("content".to_string(), content.to_string())];
        if let Some(metadata) = &metadata {
            fields.push(("metadata".to_string(), serde_json::to_string(metadata)?));
        }
        fields.push(("grams".to_string(), serde_json::to_string(&posting_keys)?));

        let mut commands = Vec::with_capacity(posting_keys.len() + 2);
        // Replace the whole record so stale fields from a prior indexing
        // (e.g. dropped metadata) cannot survive the upsert
        commands.push(KvCommand::Delete {
            key: self.doc_key(id),
        });
        commands.push(KvCommand::HashSet {
            key: self.doc_key(id),
            fields,
        });
        for key in &posting_keys {
            commands.push(KvCommand::SetAdd {
                key: key.clone(),
                member: id.to_string(),
            });
        }
        self.client.pipeline(commands).await?;

        debug!(
            target: "gramdex::remote",
            id,
            postings = posting_keys.len(),
            "indexed document"
        );
        Ok(())
    }

    async fn remove_document(&self, id: &str) -> Result<()> {
        let existed = self.retract_postings(id).await?;
        if existed {
            self.client
                .execute(KvCommand::Delete {
                    key: self.doc_key(id),
                })
                .await?;
            debug!(target: "gramdex::remote", id, "removed document");
        }
        Ok(())
    }

    async fn search(&self, search_query: &SearchQuery) -> Result<SearchResponse> {
        let deadline = self.settings.search_timeout();
        match tokio::time::timeout(deadline, self.search_inner(search_query)).await {
            Ok(result) => result,
            Err(_) => Err(Error::SearchTimeout(deadline)),
        }
    }

    async fn set_session(&self, session_id: &str, data: Metadata) -> Result<()> {
        let record = SessionRecord::new(session_id, data);
        let fields = vec![
            ("data".to_string(), serde_json::to_string(&record.data)?),
            (
                "connected_at".to_string(),
                record.connected_at.as_micros().to_string(),
            ),
            (
                "last_seen".to_string(),
                record.last_seen.as_micros().to_string(),
            ),
        ];

        self.client
            .pipeline(vec![
                KvCommand::HashSet {
                    key: self.session_key(session_id),
                    fields,
                },
                KvCommand::Expire {
                    key: self.session_key(session_id),
                    ttl: self.settings.session_ttl(),
                },
                KvCommand::SetAdd {
                    key: self.sessions_set_key(),
                    member: session_id.to_string(),
                },
            ])
            .await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let fields = self
            .client
            .execute(KvCommand::HashGetAll {
                key: self.session_key(session_id),
            })
            .await?
            .into_fields()?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.parse_session(session_id, fields)))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.client
            .pipeline(vec![
                KvCommand::Delete {
                    key: self.session_key(session_id),
                },
                KvCommand::SetRemove {
                    key: self.sessions_set_key(),
                    member: session_id.to_string(),
                },
            ])
            .await?;
        Ok(())
    }

    async fn all_sessions(&self) -> Result<Vec<SessionRecord>> {
        let session_ids = self
            .client
            .execute(KvCommand::SetMembers {
                key: self.sessions_set_key(),
            })
            .await?
            .into_members()?;
        if session_ids.is_empty() {
            return Ok(vec![]);
        }

        let commands = session_ids
            .iter()
            .map(|id| KvCommand::HashGetAll {
                key: self.session_key(id),
            })
            .collect();
        let replies = self.client.pipeline(commands).await?;

        let mut records = Vec::new();
        for (session_id, reply) in session_ids.into_iter().zip(replies) {
            let fields = reply.into_fields()?;
            if fields.is_empty() {
                // Dangling membership; cleanup() retracts it
                continue;
            }
            records.push(self.parse_session(&session_id, fields));
        }
        Ok(records)
    }

    async fn update_last_seen(&self, session_id: &str) -> Result<()> {
        let exists = !self
            .client
            .execute(KvCommand::HashGetAll {
                key: self.session_key(session_id),
            })
            .await?
            .into_fields()?
            .is_empty();
        if !exists {
            return Ok(());
        }

        self.client
            .pipeline(vec![
                KvCommand::HashSet {
                    key: self.session_key(session_id),
                    fields: vec![(
                        "last_seen".to_string(),
                        Timestamp::now().as_micros().to_string(),
                    )],
                },
                KvCommand::Expire {
                    key: self.session_key(session_id),
                    ttl: self.settings.session_ttl(),
                },
            ])
            .await?;
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        let session_ids = self
            .client
            .execute(KvCommand::SetMembers {
                key: self.sessions_set_key(),
            })
            .await?
            .into_members()?;
        if session_ids.is_empty() {
            return Ok(());
        }

        let commands = session_ids
            .iter()
            .map(|id| KvCommand::HashGetAll {
                key: self.session_key(id),
            })
            .collect();
        let replies = self.client.pipeline(commands).await?;

        let dangling: Vec<String> = session_ids
            .into_iter()
            .zip(replies)
            .filter_map(|(id, reply)| match reply.into_fields() {
                Ok(fields) if fields.is_empty() => Some(Ok(id)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<_>>()?;

        if !dangling.is_empty() {
            warn!(
                target: "gramdex::session",
                count = dangling.len(),
                "removing dangling session-set members"
            );
            let commands = dangling
                .into_iter()
                .map(|id| KvCommand::SetRemove {
                    key: self.sessions_set_key(),
                    member: id,
                })
                .collect();
            self.client.pipeline(commands).await?;
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.client.close().await?;
        info!(target: "gramdex::remote", "backend disconnected");
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let replies = self
            .client
            .pipeline(vec![
                KvCommand::Keys {
                    pattern: format!("{}doc:*", self.settings.key_prefix),
                },
                KvCommand::Keys {
                    pattern: format!("{}ngram:*", self.settings.key_prefix),
                },
                KvCommand::Keys {
                    pattern: format!("{}edge:*", self.settings.key_prefix),
                },
                KvCommand::SetMembers {
                    key: self.sessions_set_key(),
                },
            ])
            .await?;

        let mut counts = replies.into_iter();
        let documents = next_count(&mut counts)?;
        let ngrams = next_count(&mut counts)?;
        let edgegrams = next_count(&mut counts)?;
        let sessions = next_count(&mut counts)?;

        Ok(IndexStats {
            documents,
            ngrams,
            edgegrams,
            sessions,
        })
    }
}

fn next_count(replies: &mut impl Iterator<Item = KvReply>) -> Result<usize> {
    replies
        .next()
        .ok_or_else(|| {
            Error::BackendUnavailable("key-value store returned a short pipeline reply".to_string())
        })?
        .into_members()
        .map(|members| members.len())
}
