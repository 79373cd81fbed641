//! In-process key-value store
//!
//! Reference implementation of [`KvClient`] over process-local maps. It
//! honors the full command set — sets, hashes, per-key TTLs, and
//! trailing-`*` prefix patterns — and is what the remote backend's test
//! suite runs against.

use super::{KvClient, KvCommand, KvReply};
use async_trait::async_trait;
use dashmap::DashMap;
use gramdex_core::{Error, Result, Timestamp};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone)]
enum StoredValue {
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: StoredValue,
    expires_at: Option<Timestamp>,
}

impl Entry {
    fn expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local [`KvClient`] implementation
#[derive(Debug, Default)]
pub struct InProcessKv {
    entries: DashMap<String, Entry>,
}

impl InProcessKv {
    /// Create an empty store
    pub fn new() -> Self {
        InProcessKv {
            entries: DashMap::new(),
        }
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        let now = Timestamp::now();
        self.entries.iter().filter(|e| !e.expired(now)).count()
    }

    /// Drop a key if its TTL has lapsed, returning whether it is live
    fn evict_if_expired(&self, key: &str) -> bool {
        let now = Timestamp::now();
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.expired(now))
            .unwrap_or(false);
        if expired {
            self.entries.remove(key);
        }
        !expired
    }

    fn with_set<T>(&self, key: &str, f: impl FnOnce(&mut HashSet<String>) -> T) -> Result<T> {
        self.evict_if_expired(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: StoredValue::Set(HashSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            StoredValue::Set(members) => Ok(f(members)),
            StoredValue::Hash(_) => Err(wrong_kind(key, "set")),
        }
    }

    fn with_hash<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> Result<T> {
        self.evict_if_expired(key);
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: StoredValue::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            StoredValue::Hash(fields) => Ok(f(fields)),
            StoredValue::Set(_) => Err(wrong_kind(key, "hash")),
        }
    }
}

fn wrong_kind(key: &str, wanted: &str) -> Error {
    Error::BackendUnavailable(format!(
        "wrong value kind for key '{key}': expected {wanted}"
    ))
}

#[async_trait]
impl KvClient for InProcessKv {
    async fn execute(&self, command: KvCommand) -> Result<KvReply> {
        match command {
            KvCommand::SetAdd { key, member } => {
                self.with_set(&key, |members| {
                    members.insert(member);
                })?;
                Ok(KvReply::Unit)
            }
            KvCommand::SetRemove { key, member } => {
                if self.evict_if_expired(&key) {
                    let now_empty = match self.entries.get_mut(&key) {
                        Some(mut entry) => match &mut entry.value {
                            StoredValue::Set(members) => {
                                members.remove(&member);
                                members.is_empty()
                            }
                            StoredValue::Hash(_) => false,
                        },
                        None => false,
                    };
                    // A set with no members does not exist
                    if now_empty {
                        self.entries.remove(&key);
                    }
                }
                Ok(KvReply::Unit)
            }
            KvCommand::SetMembers { key } => {
                if !self.evict_if_expired(&key) {
                    return Ok(KvReply::Members(vec![]));
                }
                let members = match self.entries.get(&key) {
                    Some(entry) => match &entry.value {
                        StoredValue::Set(members) => {
                            let mut list: Vec<String> = members.iter().cloned().collect();
                            list.sort();
                            list
                        }
                        StoredValue::Hash(_) => return Err(wrong_kind(&key, "set")),
                    },
                    None => vec![],
                };
                Ok(KvReply::Members(members))
            }
            KvCommand::SetContains { key, member } => {
                if !self.evict_if_expired(&key) {
                    return Ok(KvReply::Bool(false));
                }
                let contains = match self.entries.get(&key) {
                    Some(entry) => match &entry.value {
                        StoredValue::Set(members) => members.contains(&member),
                        StoredValue::Hash(_) => return Err(wrong_kind(&key, "set")),
                    },
                    None => false,
                };
                Ok(KvReply::Bool(contains))
            }
            KvCommand::HashSet { key, fields } => {
                self.with_hash(&key, |hash| {
                    for (field, value) in fields {
                        hash.insert(field, value);
                    }
                })?;
                Ok(KvReply::Unit)
            }
            KvCommand::HashGetAll { key } => {
                if !self.evict_if_expired(&key) {
                    return Ok(KvReply::Fields(HashMap::new()));
                }
                let fields = match self.entries.get(&key) {
                    Some(entry) => match &entry.value {
                        StoredValue::Hash(fields) => fields.clone(),
                        StoredValue::Set(_) => return Err(wrong_kind(&key, "hash")),
                    },
                    None => HashMap::new(),
                };
                Ok(KvReply::Fields(fields))
            }
            KvCommand::Delete { key } => {
                self.entries.remove(&key);
                Ok(KvReply::Unit)
            }
            KvCommand::Expire { key, ttl } => {
                if self.evict_if_expired(&key) {
                    if let Some(mut entry) = self.entries.get_mut(&key) {
                        entry.expires_at = Some(Timestamp::now().saturating_add(ttl));
                    }
                }
                Ok(KvReply::Unit)
            }
            KvCommand::Keys { pattern } => {
                let now = Timestamp::now();
                let mut keys: Vec<String> = match pattern.strip_suffix('*') {
                    Some(prefix) => self
                        .entries
                        .iter()
                        .filter(|e| !e.expired(now) && e.key().starts_with(prefix))
                        .map(|e| e.key().clone())
                        .collect(),
                    None => self
                        .entries
                        .iter()
                        .filter(|e| !e.expired(now) && *e.key() == pattern)
                        .map(|e| e.key().clone())
                        .collect(),
                };
                keys.sort();
                Ok(KvReply::Members(keys))
            }
        }
    }

    async fn pipeline(&self, commands: Vec<KvCommand>) -> Result<Vec<KvReply>> {
        let mut replies = Vec::with_capacity(commands.len());
        for command in commands {
            replies.push(self.execute(command).await?);
        }
        Ok(replies)
    }

    async fn close(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
