//! Canned domain values and comparator stubs.

use chrono::{DateTime, NaiveDate, Utc};

use kyc_ledger_state::{FaceComparator, FaceVerdict, OracleError, TransactionContext};
use kyc_ledger_types::{IdDocument, ImageRef, Nationality, NewClientRecord};

/// A nationality for the given country with a plain passport document.
pub fn sample_nationality(country: &str) -> Nationality {
    Nationality {
        country_name: country.to_string(),
        id_document: IdDocument {
            doc_type: "passport".to_string(),
            number: format!("P-{country}"),
            image_ref: None,
        },
    }
}

/// A well-formed create request with one nationality and no accounts.
pub fn new_record(first: &str, last: &str, email: &str) -> NewClientRecord {
    NewClientRecord::builder()
        .first_name(first)
        .last_name(last)
        .date_of_birth(NaiveDate::from_ymd_opt(1990, 6, 15).expect("valid date"))
        .gender("unspecified")
        .email(email)
        .nationalities(vec![sample_nationality("France")])
        .build()
}

/// A transaction context with the given id and RFC 3339 timestamp,
/// submitted by `org1`.
///
/// # Panics
///
/// Panics on an invalid timestamp; fixtures take well-formed input.
pub fn tx_context(tx_id: &str, timestamp: &str) -> TransactionContext {
    let ts: DateTime<Utc> = DateTime::parse_from_rfc3339(timestamp)
        .expect("valid RFC 3339 timestamp")
        .to_utc();
    TransactionContext::new(tx_id, "org1", ts).expect("valid context")
}

/// Face comparator answering every pair with one fixed verdict.
#[derive(Debug, Clone, Copy)]
pub struct StubComparator {
    /// The verdict returned for every comparison.
    pub is_similar: bool,
}

impl StubComparator {
    /// A comparator that never reports similarity.
    pub fn never_similar() -> Self {
        Self { is_similar: false }
    }

    /// A comparator that always reports similarity.
    pub fn always_similar() -> Self {
        Self { is_similar: true }
    }
}

impl FaceComparator for StubComparator {
    fn compare(
        &self,
        _candidate: &ImageRef,
        _existing: &ImageRef,
    ) -> Result<FaceVerdict, OracleError> {
        Ok(FaceVerdict { is_similar: self.is_similar })
    }
}

/// Face comparator that always fails, for oracle-unavailability tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableComparator;

impl FaceComparator for UnavailableComparator {
    fn compare(
        &self,
        candidate: &ImageRef,
        existing: &ImageRef,
    ) -> Result<FaceVerdict, OracleError> {
        Err(OracleError {
            candidate: candidate.as_str().to_string(),
            existing: existing.as_str().to_string(),
            message: "comparator offline".to_string(),
        })
    }
}
