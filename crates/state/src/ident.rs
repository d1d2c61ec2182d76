//! Business-identifier generation.
//!
//! Identifiers have the form `{period}-{sequence}` with a zero-padded
//! sequence, e.g. `2026-000042`. The next sequence is derived by a full
//! deterministic scan of the period's key range, never from a counter:
//! counters are not guaranteed consistent across independently re-executing
//! nodes, whereas the maximum over a scan is order-independent. Cost is
//! O(n) in the number of records for the period.

use kyc_ledger_types::{IdentifierConfig, RecordId};
use snafu::ResultExt;

use crate::error::{EngineError, Result, StorageSnafu};
use crate::store::WorldState;

/// Returns the exclusive upper bound of a key-prefix scan.
///
/// Valid as long as no stored key contains U+10FFFF, which holds for the
/// ASCII identifier format.
pub(crate) fn prefix_end(prefix: &str) -> String {
    format!("{prefix}\u{10ffff}")
}

/// Derives the next identifier for the given period.
///
/// Scans every key carrying the `{period}-` prefix, parses each trailing
/// sequence, and returns `period-(max + 1)` zero-padded to
/// `config.sequence_width`. Keys under the prefix whose tail is not a
/// decimal number belong to other document kinds and are skipped. With no
/// existing keys for the period the sequence starts at 1.
///
/// # Errors
///
/// Returns `EngineError::Storage` if the range scan fails, or
/// `EngineError::InvalidArgument` if the period is empty.
pub fn next_record_id<S: WorldState>(
    store: &S,
    period: &str,
    config: &IdentifierConfig,
) -> Result<RecordId> {
    if period.trim().is_empty() {
        return Err(EngineError::InvalidArgument {
            field: "period".to_string(),
            constraint: "must not be empty".to_string(),
        });
    }

    let prefix = format!("{period}-");
    let pairs = store.range_scan(&prefix, &prefix_end(&prefix)).context(StorageSnafu)?;

    let max_sequence = pairs
        .iter()
        .filter_map(|(key, _)| key.strip_prefix(&prefix))
        .filter_map(|tail| tail.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    let sequence = max_sequence + 1;
    let id = format!("{period}-{sequence:0width$}", width = config.sequence_width);
    tracing::debug!(period, sequence, id = %id, "derived next record identifier");
    Ok(RecordId::new(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::store::InMemoryWorldState;

    fn store_with_keys(keys: &[&str]) -> InMemoryWorldState {
        let mut store = InMemoryWorldState::new();
        store.begin_transaction(
            "tx0",
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().to_utc(),
        );
        for key in keys {
            store.put(key, b"{}".to_vec()).unwrap();
        }
        store
    }

    #[test]
    fn test_empty_period_yields_sequence_one() {
        let store = store_with_keys(&[]);
        let id = next_record_id(&store, "2026", &IdentifierConfig::default()).unwrap();
        assert_eq!(id.as_str(), "2026-000001");
    }

    #[test]
    fn test_returns_max_plus_one() {
        let store = store_with_keys(&["2026-000001", "2026-000007", "2026-000003"]);
        let id = next_record_id(&store, "2026", &IdentifierConfig::default()).unwrap();
        assert_eq!(id.as_str(), "2026-000008");
    }

    #[test]
    fn test_other_periods_do_not_interfere() {
        let store = store_with_keys(&["2025-000099", "2026-000002", "2027-000050"]);
        let id = next_record_id(&store, "2026", &IdentifierConfig::default()).unwrap();
        assert_eq!(id.as_str(), "2026-000003");
    }

    #[test]
    fn test_non_numeric_tails_are_skipped() {
        let store = store_with_keys(&["2026-meta", "2026-000004"]);
        let id = next_record_id(&store, "2026", &IdentifierConfig::default()).unwrap();
        assert_eq!(id.as_str(), "2026-000005");
    }

    #[test]
    fn test_sequence_beyond_pad_width() {
        let store = store_with_keys(&["2026-1000000"]);
        let id = next_record_id(&store, "2026", &IdentifierConfig::default()).unwrap();
        assert_eq!(id.as_str(), "2026-1000001");
    }

    #[test]
    fn test_custom_width() {
        let store = store_with_keys(&[]);
        let config = IdentifierConfig { sequence_width: 3 };
        let id = next_record_id(&store, "2026", &config).unwrap();
        assert_eq!(id.as_str(), "2026-001");
    }

    #[test]
    fn test_empty_period_rejected() {
        let store = store_with_keys(&[]);
        let err = next_record_id(&store, " ", &IdentifierConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { .. }));
    }
}
