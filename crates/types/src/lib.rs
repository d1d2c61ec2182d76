//! Core types for the KYC ledger engine.
//!
//! This crate provides the foundational types shared by the state-transition
//! logic:
//! - The client record data model (records, accounts, nationalities, audit log)
//! - The canonical key-sorted codec used for byte-stable storage
//! - The machine-readable error code catalog
//! - Configuration structs with post-deserialization validation
//! - Field-level input validation

#![deny(unsafe_code)]

pub mod audit;
pub mod codec;
pub mod config;
pub mod error;
pub mod record;
pub mod validation;

// Re-export commonly used types at crate root
pub use audit::{AuditAction, AuditEntry};
pub use codec::{CodecError, decode, encode};
pub use config::{ConfigError, EngineConfig, IdentifierConfig, ScoringConfig, ValidationConfig};
pub use error::ErrorCode;
pub use record::{
    Account, ClientRecord, CreatedBy, IdDocument, ImageRef, Nationality, NewClientRecord,
    RecordId, RecordKind,
};
pub use validation::ValidationError;
