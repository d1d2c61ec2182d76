//! Deterministic state-transition engine for the KYC ledger.
//!
//! This crate sits between the domain types (`kyc-ledger-types`) and the
//! ledger platform's world-state store, providing:
//!
//! - The [`WorldState`] adapter contract the engine depends on, plus an
//!   in-memory implementation with per-key history for tests and embedding
//! - Business-identifier generation by deterministic keyspace scan
//! - The weighted duplicate-likelihood scorer with its fixed name-similarity
//!   metric and injected face comparator
//! - The client-record engine: create, read, update, activation lifecycle,
//!   account and nationality mutation
//! - Per-key history reconstruction pairing store history with the in-record
//!   audit journal
//!
//! Every operation computes its output solely from its arguments and freshly
//! read store state. Nothing here touches a wall clock, local randomness, or
//! unordered iteration: identical inputs on independent execution nodes
//! produce byte-identical writes.

#![deny(unsafe_code)]

mod context;
mod engine;
mod error;
mod history;
mod ident;
mod similarity;
mod store;

pub use context::TransactionContext;
pub use engine::{AttributeUpdate, ClientRecordEngine, CreateOutcome};
pub use error::{EngineError, Result};
pub use history::{HistoryEntry, get_history};
pub use ident::next_record_id;
pub use similarity::{
    FaceComparator, FaceVerdict, OracleError, PrecomputedVerdicts, SimilarityMatch,
    SimilarityScorer, name_similarity, normalize_name,
};
pub use store::{InMemoryWorldState, KeyModification, SharedWorldState, StoreError, WorldState};
