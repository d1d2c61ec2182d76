//! Shared test utilities for kyc-ledger crates.
//!
//! Reduces boilerplate across test modules:
//!
//! - [`fixtures`] - canned records, contexts, and comparator stubs
//! - [`strategies`] - proptest generators for domain values

#![deny(unsafe_code)]

pub mod fixtures;
pub mod strategies;

pub use fixtures::{StubComparator, UnavailableComparator, new_record, sample_nationality, tx_context};
pub use strategies::{arb_account, arb_name, arb_new_record};
