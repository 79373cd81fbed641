//! Key-value store capability consumed by the remote backend
//!
//! The remote backend never speaks a wire protocol itself: it issues
//! [`KvCommand`]s through the [`KvClient`] trait and interprets
//! [`KvReply`]s. A client may be backed by a persistent binary-protocol
//! connection or by discrete HTTP calls; the engine logic is identical
//! either way, which is why the command set — not a connection handle — is
//! the abstraction boundary.
//!
//! `pipeline` executes a batch in order over one round trip (pipelined,
//! not transactional). The engine leans on it to bound tail latency: one
//! round trip per query term's full gram set, one for all candidate
//! document fetches.

pub mod memory;

use async_trait::async_trait;
use gramdex_core::{Error, Result};
use std::collections::HashMap;
use std::time::Duration;

pub use memory::InProcessKv;

/// One primitive command against the key-value store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvCommand {
    /// Add a member to the named set
    SetAdd {
        /// Set key
        key: String,
        /// Member to add
        member: String,
    },
    /// Remove a member from the named set
    SetRemove {
        /// Set key
        key: String,
        /// Member to remove
        member: String,
    },
    /// Enumerate all members of the named set
    SetMembers {
        /// Set key
        key: String,
    },
    /// Test membership in the named set
    SetContains {
        /// Set key
        key: String,
        /// Member to test
        member: String,
    },
    /// Set one or more fields on the named hash
    HashSet {
        /// Hash key
        key: String,
        /// Field name/value pairs
        fields: Vec<(String, String)>,
    },
    /// Fetch every field of the named hash
    HashGetAll {
        /// Hash key
        key: String,
    },
    /// Delete a key of any kind
    Delete {
        /// Key to delete
        key: String,
    },
    /// Set a key's time-to-live
    Expire {
        /// Key to expire
        key: String,
        /// Time until expiry
        ttl: Duration,
    },
    /// Enumerate keys matching a pattern
    ///
    /// Only trailing-`*` prefix patterns are required; reserved for the
    /// fallback posting-removal path.
    Keys {
        /// Match pattern, e.g. `gramdex:ngram:*`
        pattern: String,
    },
}

/// Reply to one [`KvCommand`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvReply {
    /// Command completed with nothing to return
    Unit,
    /// Boolean result (`SetContains`)
    Bool(bool),
    /// Member or key list (`SetMembers`, `Keys`)
    Members(Vec<String>),
    /// Hash contents (`HashGetAll`); empty when the key does not exist
    Fields(HashMap<String, String>),
}

impl KvReply {
    /// Interpret this reply as a member/key list
    pub fn into_members(self) -> Result<Vec<String>> {
        match self {
            KvReply::Members(members) => Ok(members),
            other => Err(unexpected("member list", &other)),
        }
    }

    /// Interpret this reply as hash contents
    pub fn into_fields(self) -> Result<HashMap<String, String>> {
        match self {
            KvReply::Fields(fields) => Ok(fields),
            other => Err(unexpected("hash fields", &other)),
        }
    }

    /// Interpret this reply as a boolean
    pub fn into_bool(self) -> Result<bool> {
        match self {
            KvReply::Bool(value) => Ok(value),
            other => Err(unexpected("boolean", &other)),
        }
    }
}

fn unexpected(wanted: &str, got: &KvReply) -> Error {
    Error::BackendUnavailable(format!(
        "key-value store protocol mismatch: expected {wanted}, got {got:?}"
    ))
}

/// Transport-agnostic key-value store client
///
/// Implementations must be `Send + Sync`. All operations are async; a
/// failed transport surfaces `Error::BackendUnavailable`.
#[async_trait]
pub trait KvClient: Send + Sync {
    /// Execute one command
    async fn execute(&self, command: KvCommand) -> Result<KvReply>;

    /// Execute a batch of commands in order over one round trip
    ///
    /// Replies are positional: `replies[i]` answers `commands[i]`.
    async fn pipeline(&self, commands: Vec<KvCommand>) -> Result<Vec<KvReply>>;

    /// Release the underlying connection or resources
    async fn close(&self) -> Result<()>;
}
