//! World-state store adapter.
//!
//! The engine needs five operations from the ledger platform's key-value
//! world state: point read, point write, point delete, lexicographic range
//! scan, and per-key modification history. [`WorldState`] captures exactly
//! that contract; the platform supplies the production implementation and
//! [`InMemoryWorldState`] is the in-process twin used by tests and
//! embedders.
//!
//! All calls are synchronous from the engine's perspective and complete
//! before the next step of an invocation runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use snafu::Snafu;

/// Errors surfaced by a world-state backend.
///
/// Backends vary (ledger shim, in-memory map), so the contract carries the
/// failed operation and a backend-supplied message rather than a concrete
/// source type.
#[derive(Debug, Snafu)]
pub enum StoreError {
    /// A point read failed.
    #[snafu(display("store read of '{key}' failed: {message}"))]
    Read {
        /// The key being read.
        key: String,
        /// Backend-supplied failure description.
        message: String,
    },

    /// A write or delete failed.
    #[snafu(display("store write of '{key}' failed: {message}"))]
    Write {
        /// The key being written.
        key: String,
        /// Backend-supplied failure description.
        message: String,
    },

    /// A range scan failed.
    #[snafu(display("store scan [{start}, {end}) failed: {message}"))]
    Scan {
        /// Inclusive scan start key.
        start: String,
        /// Exclusive scan end key.
        end: String,
        /// Backend-supplied failure description.
        message: String,
    },

    /// Per-key history retrieval failed.
    #[snafu(display("store history of '{key}' failed: {message}"))]
    History {
        /// The key whose history was requested.
        key: String,
        /// Backend-supplied failure description.
        message: String,
    },
}

/// One raw entry of a key's modification history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    /// Identifier of the transaction that made this modification.
    pub tx_id: String,
    /// Deterministic timestamp of that transaction.
    pub timestamp: DateTime<Utc>,
    /// Whether this modification deleted the key.
    pub is_delete: bool,
    /// The stored bytes after the modification; empty for deletes.
    pub value: Vec<u8>,
}

/// The narrow store contract the engine depends on.
///
/// Scan results are returned in ascending key order; history entries oldest
/// first. Implementations must not reorder either.
pub trait WorldState {
    /// Returns the bytes stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key`, replacing any existing value.
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    /// Returns all `(key, value)` pairs with `start <= key < end`,
    /// ascending by key.
    fn range_scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Returns the modification history of `key`, oldest entry first.
    fn history_of(&self, key: &str) -> Result<Vec<KeyModification>, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    live: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
    tx_id: String,
    tx_timestamp: DateTime<Utc>,
}

/// In-memory world state with per-key history recording.
///
/// Writes are attributed to the transaction last announced via
/// [`begin_transaction`](Self::begin_transaction), mirroring how the ledger
/// platform stamps history entries with the enclosing transaction.
#[derive(Debug, Default)]
pub struct InMemoryWorldState {
    inner: Inner,
}

impl InMemoryWorldState {
    /// Creates an empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transaction identity stamped onto subsequent writes.
    pub fn begin_transaction(&mut self, tx_id: impl Into<String>, timestamp: DateTime<Utc>) {
        self.inner.tx_id = tx_id.into();
        self.inner.tx_timestamp = timestamp;
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> usize {
        self.inner.live.len()
    }

    /// Returns true if no keys are live.
    pub fn is_empty(&self) -> bool {
        self.inner.live.is_empty()
    }

    fn record_modification(&mut self, key: &str, is_delete: bool, value: Vec<u8>) {
        let entry = KeyModification {
            tx_id: self.inner.tx_id.clone(),
            timestamp: self.inner.tx_timestamp,
            is_delete,
            value,
        };
        self.inner.history.entry(key.to_string()).or_default().push(entry);
    }
}

impl WorldState for InMemoryWorldState {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.live.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.live.insert(key.to_string(), value.clone());
        self.record_modification(key, false, value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if self.inner.live.remove(key).is_some() {
            self.record_modification(key, true, Vec::new());
        }
        Ok(())
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let pairs = self
            .inner
            .live
            .range(start.to_string()..end.to_string())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(pairs)
    }

    fn history_of(&self, key: &str) -> Result<Vec<KeyModification>, StoreError> {
        Ok(self.inner.history.get(key).cloned().unwrap_or_default())
    }
}

/// A shareable handle over an [`InMemoryWorldState`].
///
/// Lets an embedder hold the store while the engine mutates it. Cloning
/// shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct SharedWorldState {
    inner: Arc<RwLock<InMemoryWorldState>>,
}

impl SharedWorldState {
    /// Creates an empty shared world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transaction identity stamped onto subsequent writes.
    pub fn begin_transaction(&self, tx_id: impl Into<String>, timestamp: DateTime<Utc>) {
        self.inner.write().begin_transaction(tx_id, timestamp);
    }

    /// Runs `f` with read access to the underlying store.
    pub fn with_read<R>(&self, f: impl FnOnce(&InMemoryWorldState) -> R) -> R {
        f(&self.inner.read())
    }
}

impl WorldState for SharedWorldState {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.read().get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.write().put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.write().delete(key)
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.inner.read().range_scan(start, end)
    }

    fn history_of(&self, key: &str) -> Result<Vec<KeyModification>, StoreError> {
        self.inner.read().history_of(key)
    }
}
