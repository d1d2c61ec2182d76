//! Duplicate-screening behavior of the create path.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;
use kyc_ledger_state::{
    ClientRecordEngine, CreateOutcome, EngineError, InMemoryWorldState, KeyModification,
    StoreError, WorldState,
};
use kyc_ledger_test_utils::fixtures::{
    StubComparator, UnavailableComparator, new_record, tx_context,
};
use kyc_ledger_types::{ImageRef, NewClientRecord};

fn create_first(
    engine: &ClientRecordEngine,
    store: &mut InMemoryWorldState,
) -> kyc_ledger_types::RecordId {
    let ctx = tx_context("tx1", "2026-01-01T00:00:00Z");
    store.begin_transaction("tx1", ctx.transaction_timestamp());
    match engine
        .create(
            store,
            &ctx,
            &StubComparator::never_similar(),
            new_record("Mina", "Okafor", "mina@example.com"),
        )
        .unwrap()
    {
        CreateOutcome::Created { record } => record.id,
        CreateOutcome::PotentialDuplicate { .. } => panic!("store was empty"),
    }
}

#[test]
fn score_forty_five_is_admitted() {
    // Identical email (40) + identical date of birth (5) = 45, below the
    // threshold of 50: the candidate is created, not flagged.
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();
    create_first(&engine, &mut store);

    // Same email and birth date as the fixture, unrelated name.
    let candidate = new_record("Zoe", "Quinn", "mina@example.com");
    let ctx = tx_context("tx2", "2026-01-02T00:00:00Z");
    store.begin_transaction("tx2", ctx.transaction_timestamp());
    let outcome = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), candidate)
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::Created { .. }));
}

#[test]
fn score_fifty_five_is_flagged_and_not_written() {
    // Adding an identical normalized name (10) to email (40) and birth
    // date (5) crosses the threshold; nothing is written.
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();
    create_first(&engine, &mut store);
    let records_before = engine.list_records(&store).unwrap().len();

    let candidate = new_record("Mina", "Okafor", "mina@example.com");
    let ctx = tx_context("tx2", "2026-01-02T00:00:00Z");
    store.begin_transaction("tx2", ctx.transaction_timestamp());
    let outcome = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), candidate.clone())
        .unwrap();

    match outcome {
        CreateOutcome::PotentialDuplicate { candidate: returned, matches } => {
            assert_eq!(returned, candidate);
            assert_eq!(matches.len(), 1);
            assert!(matches[0].score >= 55, "got {}", matches[0].score);
            assert!(matches[0].reasons.iter().any(|r| r == "identical email"));
        }
        CreateOutcome::Created { .. } => panic!("candidate should have been flagged"),
    }
    assert_eq!(engine.list_records(&store).unwrap().len(), records_before);
}

#[test]
fn inactive_records_still_participate_in_screening() {
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();
    let id = create_first(&engine, &mut store);

    let ctx = tx_context("tx2", "2026-01-02T00:00:00Z");
    store.begin_transaction("tx2", ctx.transaction_timestamp());
    engine.deactivate(&mut store, &ctx, &id).unwrap();

    let candidate = new_record("Mina", "Okafor", "mina@example.com");
    let ctx = tx_context("tx3", "2026-01-03T00:00:00Z");
    store.begin_transaction("tx3", ctx.transaction_timestamp());
    let outcome = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), candidate)
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::PotentialDuplicate { .. }));
}

#[test]
fn face_verdict_alone_plus_birth_date_crosses_threshold() {
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();

    let ctx = tx_context("tx1", "2026-01-01T00:00:00Z");
    store.begin_transaction("tx1", ctx.transaction_timestamp());
    let mut first = new_record("Mina", "Okafor", "mina@example.com");
    first.face_image_ref = Some(ImageRef::new("img-1"));
    engine.create(&mut store, &ctx, &StubComparator::never_similar(), first).unwrap();

    // Unrelated identity, same birth date, similar face: 40 + 5 = 45 is
    // still under the threshold without any further overlap.
    let mut candidate = new_record("Zoe", "Quinn", "zoe@example.com");
    candidate.face_image_ref = Some(ImageRef::new("img-2"));
    let ctx = tx_context("tx2", "2026-01-02T00:00:00Z");
    store.begin_transaction("tx2", ctx.transaction_timestamp());
    let outcome = engine
        .create(&mut store, &ctx, &StubComparator::always_similar(), candidate)
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::Created { .. }));

    // Same again plus an identical email reaches 85 and is flagged.
    let mut candidate = new_record("Lia", "Okonkwo", "mina@example.com");
    candidate.face_image_ref = Some(ImageRef::new("img-3"));
    let ctx = tx_context("tx3", "2026-01-03T00:00:00Z");
    store.begin_transaction("tx3", ctx.transaction_timestamp());
    let outcome = engine
        .create(&mut store, &ctx, &StubComparator::always_similar(), candidate)
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::PotentialDuplicate { .. }));
}

#[test]
fn oracle_unavailability_aborts_creation() {
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();

    let ctx = tx_context("tx1", "2026-01-01T00:00:00Z");
    store.begin_transaction("tx1", ctx.transaction_timestamp());
    let mut first = new_record("Mina", "Okafor", "mina@example.com");
    first.face_image_ref = Some(ImageRef::new("img-1"));
    engine.create(&mut store, &ctx, &StubComparator::never_similar(), first).unwrap();
    let records_before = engine.list_records(&store).unwrap().len();

    let mut candidate = new_record("Zoe", "Quinn", "zoe@example.com");
    candidate.face_image_ref = Some(ImageRef::new("img-2"));
    let ctx = tx_context("tx2", "2026-01-02T00:00:00Z");
    store.begin_transaction("tx2", ctx.transaction_timestamp());
    let err = engine
        .create(&mut store, &ctx, &UnavailableComparator, candidate)
        .unwrap_err();

    // Unknown is never treated as "not similar": creation aborts with no
    // write.
    assert!(matches!(err, EngineError::OracleUnavailable { .. }));
    assert_eq!(engine.list_records(&store).unwrap().len(), records_before);
}

#[test]
fn screening_is_deterministic() {
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();
    create_first(&engine, &mut store);

    let candidate = new_record("Mina", "Okafor", "mina@example.com");
    let ctx = tx_context("tx2", "2026-01-02T00:00:00Z");
    store.begin_transaction("tx2", ctx.transaction_timestamp());

    let first = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), candidate.clone())
        .unwrap();
    let second = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), candidate)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn create_validation_failures_write_nothing() {
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();
    let ctx = tx_context("tx1", "2026-01-01T00:00:00Z");
    store.begin_transaction("tx1", ctx.transaction_timestamp());

    let mut no_nationality = new_record("Ada", "Lovelace", "ada@example.com");
    no_nationality.nationalities.clear();
    let err = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), no_nationality)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { ref field, .. } if field == "nationalities"));

    let bad_email = NewClientRecord {
        email: "not-an-email".to_string(),
        ..new_record("Ada", "Lovelace", "ada@example.com")
    };
    let err = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), bad_email)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { ref field, .. } if field == "email"));

    assert!(store.is_empty());
}

/// Store double whose scans see nothing but whose point reads collide,
/// exercising the existence re-check after identifier derivation.
#[derive(Default)]
struct CollidingStore {
    inner: InMemoryWorldState,
}

impl WorldState for CollidingStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(Some(b"{}".to_vec()))
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    fn range_scan(&self, _start: &str, _end: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(Vec::new())
    }

    fn history_of(&self, key: &str) -> Result<Vec<KeyModification>, StoreError> {
        self.inner.history_of(key)
    }
}

#[test]
fn existing_key_after_derivation_is_duplicate_key() {
    let engine = ClientRecordEngine::default();
    let mut store = CollidingStore::default();
    let ctx = tx_context("tx1", "2026-01-01T00:00:00Z");
    let err = engine
        .create(
            &mut store,
            &ctx,
            &StubComparator::never_similar(),
            new_record("Ada", "Lovelace", "ada@example.com"),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateKey { ref id } if id == "2026-000001"));

    // Not blindly retryable: the caller must re-derive the identifier.
    assert!(!err.is_retryable());
}

#[test]
fn scoring_date_of_birth_difference_avoids_flag() {
    // Same email only (40) stays under the threshold when the birth dates
    // differ.
    let engine = ClientRecordEngine::default();
    let mut store = InMemoryWorldState::new();
    create_first(&engine, &mut store);

    let mut candidate = new_record("Zoe", "Quinn", "mina@example.com");
    candidate.date_of_birth = NaiveDate::from_ymd_opt(1975, 2, 3).unwrap();
    let ctx = tx_context("tx2", "2026-01-02T00:00:00Z");
    store.begin_transaction("tx2", ctx.transaction_timestamp());
    let outcome = engine
        .create(&mut store, &ctx, &StubComparator::never_similar(), candidate)
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::Created { .. }));
}
