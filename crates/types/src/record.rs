//! Client record data model.
//!
//! The [`ClientRecord`] is the unit of storage: one world-state entry per
//! record, keyed by its business identifier. All types serialize with
//! camelCase field names, which is the wire and storage shape consumed by
//! the routing layer.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditEntry;

/// Business identifier of a client record.
///
/// Globally unique, immutable once assigned. Formed as
/// `{period}-{sequence}` with a zero-padded sequence, e.g. `2026-000042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates an identifier from a raw string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque reference to a biometric image.
///
/// Consumed only by the face comparator; the core never dereferences it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates an image reference from a raw string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the reference as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminator distinguishing stored document types sharing one keyspace.
///
/// Every range scan filters on this tag explicitly rather than relying on
/// document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A bank-customer identity record.
    Client,
}

impl RecordKind {
    /// Returns the kind as a static string label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
        }
    }
}

/// A bank account held by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account number, unique within one record's account list.
    pub account_number: String,
    /// Name of the bank holding the account.
    pub bank_name: String,
}

/// Identity document backing a nationality claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdDocument {
    /// Document type (passport, national id card, ...).
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Document number.
    pub number: String,
    /// Optional reference to a scan of the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,
}

/// A nationality held by a client, with its backing identity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nationality {
    /// Country name, unique within one record's nationality list.
    pub country_name: String,
    /// The identity document supporting this nationality.
    pub id_document: IdDocument,
}

/// Creation provenance, set once at create time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBy {
    /// Organization that submitted the create transaction.
    pub organization_id: String,
    /// Deterministic transaction timestamp of the create.
    pub timestamp: DateTime<Utc>,
}

/// A client identity record — the root entity of the ledger.
///
/// One world-state entry per record, keyed by [`RecordId`]. Never physically
/// deleted: deactivation flips [`is_active`](Self::is_active) and is
/// reversible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    /// Business identifier, immutable once assigned.
    #[builder(into)]
    pub id: RecordId,
    /// Document-kind discriminator.
    pub record_kind: RecordKind,
    /// Given name.
    #[builder(into)]
    pub first_name: String,
    /// Family name.
    #[builder(into)]
    pub last_name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Gender as free-form text.
    #[builder(into)]
    pub gender: String,
    /// Contact email address.
    #[builder(into)]
    pub email: String,
    /// Bank accounts, ordered by insertion; account numbers unique.
    #[builder(default)]
    pub account_list: Vec<Account>,
    /// Nationalities, ordered by insertion; country names unique.
    /// Invariant: never empty.
    pub nationalities: Vec<Nationality>,
    /// Optional biometric image reference used by duplicate screening.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_image_ref: Option<ImageRef>,
    /// Whether the record is active; gates account/nationality mutation.
    pub is_active: bool,
    /// Creation provenance.
    pub created_by: CreatedBy,
    /// Append-only in-record change journal.
    #[builder(default)]
    pub audit_log: Vec<AuditEntry>,
}

impl ClientRecord {
    /// Returns the account with the given number, if present.
    pub fn find_account(&self, account_number: &str) -> Option<&Account> {
        self.account_list.iter().find(|a| a.account_number == account_number)
    }

    /// Returns true if an account with this number is already present.
    pub fn has_account(&self, account_number: &str) -> bool {
        self.find_account(account_number).is_some()
    }

    /// Returns true if a nationality for this country is already present.
    ///
    /// Country names compare case-insensitively after trimming.
    pub fn has_nationality(&self, country_name: &str) -> bool {
        let wanted = country_name.trim().to_lowercase();
        self.nationalities.iter().any(|n| n.country_name.trim().to_lowercase() == wanted)
    }

    /// Appends an entry to the in-record audit journal.
    pub fn append_audit(&mut self, entry: AuditEntry) {
        self.audit_log.push(entry);
    }

    /// Returns the most recent audit entry, if any.
    pub fn latest_audit(&self) -> Option<&AuditEntry> {
        self.audit_log.last()
    }
}

/// Input for the create operation: a record before identifier assignment.
///
/// The engine validates this, screens it for duplicates, and only then
/// materializes a [`ClientRecord`] with a freshly generated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct NewClientRecord {
    /// Given name.
    #[builder(into)]
    pub first_name: String,
    /// Family name.
    #[builder(into)]
    pub last_name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Gender as free-form text.
    #[builder(into)]
    pub gender: String,
    /// Contact email address.
    #[builder(into)]
    pub email: String,
    /// Initial bank accounts, possibly empty.
    #[builder(default)]
    #[serde(default)]
    pub account_list: Vec<Account>,
    /// Nationalities; at least one is required.
    pub nationalities: Vec<Nationality>,
    /// Optional biometric image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_image_ref: Option<ImageRef>,
}
