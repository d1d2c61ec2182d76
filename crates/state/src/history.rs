//! Per-key history reconstruction.
//!
//! Pairs the store's raw modification history with each version's own
//! embedded latest audit entry, producing a chronological change report. A
//! history entry whose stored bytes fail to decode is flagged, not fatal:
//! the report still covers every modification the store knows about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use kyc_ledger_types::{AuditEntry, ClientRecord, RecordId, codec};

use crate::error::{EngineError, Result, StorageSnafu};
use crate::store::WorldState;

/// One reconstructed version of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Identifier of the transaction that produced this version.
    pub transaction_id: String,
    /// Deterministic timestamp of that transaction.
    pub timestamp: DateTime<Utc>,
    /// Whether the modification deleted the key.
    pub is_delete: bool,
    /// The record as of this version; `None` for deletes and undecodable
    /// versions.
    pub value: Option<ClientRecord>,
    /// The audit entry the version carried as its latest, describing the
    /// modification; `None` when the value is unavailable or unaudited.
    pub modification_details: Option<AuditEntry>,
    /// Set when the stored bytes of this version failed to decode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

/// Reconstructs the chronological change history of a record.
///
/// Entries are ordered by timestamp, with the store's own history order
/// breaking ties, so adapters that do not guarantee chronological output
/// still produce a stable report.
///
/// # Errors
///
/// Returns `NotFound` if the identifier holds no live record, `Storage` if
/// the adapter's history retrieval fails. Individual undecodable versions
/// are flagged via [`HistoryEntry::decode_error`], never an error.
pub fn get_history<S: WorldState>(store: &S, id: &RecordId) -> Result<Vec<HistoryEntry>> {
    if store.get(id.as_str()).context(StorageSnafu)?.is_none() {
        return Err(EngineError::NotFound { id: id.as_str().to_string() });
    }

    let modifications = store.history_of(id.as_str()).context(StorageSnafu)?;
    let mut entries: Vec<(usize, HistoryEntry)> = modifications
        .into_iter()
        .enumerate()
        .map(|(index, m)| {
            let entry = if m.is_delete {
                HistoryEntry {
                    transaction_id: m.tx_id,
                    timestamp: m.timestamp,
                    is_delete: true,
                    value: None,
                    modification_details: None,
                    decode_error: None,
                }
            } else {
                match codec::decode::<ClientRecord>(&m.value) {
                    Ok(record) => HistoryEntry {
                        transaction_id: m.tx_id,
                        timestamp: m.timestamp,
                        is_delete: false,
                        modification_details: record.latest_audit().cloned(),
                        value: Some(record),
                        decode_error: None,
                    },
                    Err(e) => HistoryEntry {
                        transaction_id: m.tx_id,
                        timestamp: m.timestamp,
                        is_delete: false,
                        value: None,
                        modification_details: None,
                        decode_error: Some(e.to_string()),
                    },
                }
            };
            (index, entry)
        })
        .collect();

    entries.sort_by(|(ia, a), (ib, b)| a.timestamp.cmp(&b.timestamp).then(ia.cmp(ib)));
    Ok(entries.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::context::TransactionContext;
    use crate::engine::{ClientRecordEngine, CreateOutcome};
    use crate::similarity::PrecomputedVerdicts;
    use crate::store::InMemoryWorldState;
    use kyc_ledger_types::{Account, AuditAction, IdDocument, Nationality, NewClientRecord};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().to_utc()
    }

    fn ctx(tx: &str, at: &str) -> TransactionContext {
        TransactionContext::new(tx, "org1", ts(at)).unwrap()
    }

    fn request() -> NewClientRecord {
        NewClientRecord::builder()
            .first_name("Ada")
            .last_name("Lovelace")
            .date_of_birth(chrono::NaiveDate::from_ymd_opt(1990, 12, 10).unwrap())
            .gender("female")
            .email("ada@example.com")
            .nationalities(vec![Nationality {
                country_name: "United Kingdom".to_string(),
                id_document: IdDocument {
                    doc_type: "passport".to_string(),
                    number: "P-1".to_string(),
                    image_ref: None,
                },
            }])
            .build()
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let store = InMemoryWorldState::new();
        let err = get_history(&store, &RecordId::new("2026-000001")).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_history_pairs_versions_with_audit_entries() {
        let engine = ClientRecordEngine::default();
        let comparator = PrecomputedVerdicts::new();
        let mut store = InMemoryWorldState::new();

        let create_ctx = ctx("tx1", "2026-01-01T10:00:00Z");
        store.begin_transaction("tx1", create_ctx.transaction_timestamp());
        let outcome = engine.create(&mut store, &create_ctx, &comparator, request()).unwrap();
        let id = match outcome {
            CreateOutcome::Created { record } => record.id,
            CreateOutcome::PotentialDuplicate { .. } => panic!("unexpected duplicate"),
        };

        let add_ctx = ctx("tx2", "2026-01-02T10:00:00Z");
        store.begin_transaction("tx2", add_ctx.transaction_timestamp());
        engine
            .add_account(
                &mut store,
                &add_ctx,
                &id,
                Account { account_number: "ACC1".to_string(), bank_name: "BankX".to_string() },
            )
            .unwrap();

        let history = get_history(&store, &id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].transaction_id, "tx1");
        assert_eq!(
            history[0].modification_details.as_ref().unwrap().action,
            AuditAction::Create
        );
        assert_eq!(history[1].transaction_id, "tx2");
        assert_eq!(
            history[1].modification_details.as_ref().unwrap().action,
            AuditAction::AddAccount
        );
        assert_eq!(
            history[1].modification_details.as_ref().unwrap().detail.as_deref(),
            Some("ACC1 at BankX")
        );
        assert!(history[0].timestamp < history[1].timestamp);
    }

    #[test]
    fn test_undecodable_version_is_flagged_not_fatal() {
        let engine = ClientRecordEngine::default();
        let comparator = PrecomputedVerdicts::new();
        let mut store = InMemoryWorldState::new();

        let create_ctx = ctx("tx1", "2026-01-01T10:00:00Z");
        store.begin_transaction("tx1", create_ctx.transaction_timestamp());
        let outcome = engine.create(&mut store, &create_ctx, &comparator, request()).unwrap();
        let id = match outcome {
            CreateOutcome::Created { record } => record.id,
            CreateOutcome::PotentialDuplicate { .. } => panic!("unexpected duplicate"),
        };

        // A corrupt intermediate version written outside the engine.
        store.begin_transaction("tx2", ts("2026-01-02T10:00:00Z"));
        store.put(id.as_str(), b"corrupt bytes".to_vec()).unwrap();

        let repair_ctx = ctx("tx3", "2026-01-03T10:00:00Z");
        store.begin_transaction("tx3", repair_ctx.transaction_timestamp());
        let record = engine.read(&store, &id);
        assert!(record.is_err(), "live value is corrupt");

        let history = get_history(&store, &id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].decode_error.is_none());
        assert!(history[1].decode_error.is_some());
        assert!(history[1].value.is_none());
    }

    #[test]
    fn test_delete_version_has_no_value() {
        let mut store = InMemoryWorldState::new();
        store.begin_transaction("tx1", ts("2026-01-01T00:00:00Z"));
        store.put("2026-000001", b"{}".to_vec()).unwrap();
        store.begin_transaction("tx2", ts("2026-01-02T00:00:00Z"));
        store.delete("2026-000001").unwrap();
        store.begin_transaction("tx3", ts("2026-01-03T00:00:00Z"));
        store.put("2026-000001", b"{}".to_vec()).unwrap();

        let history = get_history(&store, &RecordId::new("2026-000001")).unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[1].is_delete);
        assert!(history[1].value.is_none());
        assert!(history[1].decode_error.is_none());
    }
}
