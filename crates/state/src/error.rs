//! Engine error taxonomy.
//!
//! Every validation failure aborts the invocation immediately with no
//! partial write: the store never observes a record mid-mutation. Errors
//! are not retried internally; [`EngineError::code`] exposes the
//! machine-readable [`ErrorCode`] with its retryability classification for
//! the calling layer.

use snafu::Snafu;

use kyc_ledger_types::{CodecError, ErrorCode};

use crate::similarity::OracleError;
use crate::store::StoreError;

/// Result type for engine operations.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors surfaced by the client-record engine.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EngineError {
    /// The addressed record does not exist.
    #[snafu(display("client record '{id}' not found"))]
    NotFound {
        /// The missing business identifier.
        id: String,
    },

    /// A freshly generated identifier already exists in the store.
    ///
    /// The caller must re-derive a fresh identifier before retrying.
    #[snafu(display("client record '{id}' already exists"))]
    DuplicateKey {
        /// The colliding business identifier.
        id: String,
    },

    /// The account number is already present on the record.
    #[snafu(display("account '{account_number}' already present on record '{id}'"))]
    DuplicateAccount {
        /// The record being mutated.
        id: String,
        /// The duplicated account number.
        account_number: String,
    },

    /// The country is already present on the record.
    #[snafu(display("nationality '{country_name}' already present on record '{id}'"))]
    DuplicateNationality {
        /// The record being mutated.
        id: String,
        /// The duplicated country name.
        country_name: String,
    },

    /// No account with the given number exists on the record.
    #[snafu(display("account '{account_number}' not found on record '{id}'"))]
    AccountNotFound {
        /// The record being mutated.
        id: String,
        /// The missing account number.
        account_number: String,
    },

    /// No nationality for the given country exists on the record.
    #[snafu(display("nationality '{country_name}' not found on record '{id}'"))]
    NationalityNotFound {
        /// The record being mutated.
        id: String,
        /// The missing country name.
        country_name: String,
    },

    /// Removal would leave the record without any nationality.
    #[snafu(display("record '{id}' must retain at least one nationality"))]
    LastNationality {
        /// The record being mutated.
        id: String,
    },

    /// The record is inactive and rejects account/nationality mutation.
    #[snafu(display("record '{id}' is inactive"))]
    InactiveRecord {
        /// The inactive record.
        id: String,
    },

    /// The record is already in the requested activation state.
    #[snafu(display("record '{id}' is already {}", if *active { "active" } else { "inactive" }))]
    AlreadyInState {
        /// The record being mutated.
        id: String,
        /// The state the record is already in.
        active: bool,
    },

    /// An attribute update named a field outside the allow-list.
    #[snafu(display("field '{field}' may not be updated"))]
    ForbiddenField {
        /// The rejected field name.
        field: String,
    },

    /// An argument value is missing, empty, or out of range.
    #[snafu(display("invalid argument '{field}': {constraint}"))]
    InvalidArgument {
        /// The offending field.
        field: String,
        /// The violated constraint.
        constraint: String,
    },

    /// Canonical encoding or decoding failed.
    #[snafu(display("codec failure: {source}"))]
    Codec {
        /// The underlying codec error.
        source: CodecError,
    },

    /// The face-similarity oracle could not produce a verdict.
    ///
    /// Never treated as "not similar": creation aborts instead of admitting
    /// an unscreened candidate.
    #[snafu(display("face oracle unavailable: {source}"))]
    OracleUnavailable {
        /// The underlying oracle error.
        source: OracleError,
    },

    /// A world-state operation failed.
    #[snafu(display("storage failure: {source}"))]
    Storage {
        /// The underlying store error.
        source: StoreError,
    },
}

impl EngineError {
    /// Maps this error to its machine-readable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::DuplicateKey { .. } => ErrorCode::DuplicateKey,
            Self::DuplicateAccount { .. } => ErrorCode::DuplicateAccount,
            Self::DuplicateNationality { .. } => ErrorCode::DuplicateNationality,
            Self::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            Self::NationalityNotFound { .. } => ErrorCode::NationalityNotFound,
            Self::LastNationality { .. } => ErrorCode::LastNationality,
            Self::InactiveRecord { .. } => ErrorCode::InactiveRecord,
            Self::AlreadyInState { .. } => ErrorCode::AlreadyInState,
            Self::ForbiddenField { .. } => ErrorCode::ForbiddenField,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Codec { source } => match source {
                CodecError::Encode { .. } => ErrorCode::EncodeFailed,
                CodecError::Decode { .. } => ErrorCode::DecodeFailed,
            },
            Self::OracleUnavailable { .. } => ErrorCode::OracleUnavailable,
            Self::Storage { source } => match source {
                StoreError::Read { .. } => ErrorCode::StoreRead,
                StoreError::Write { .. } => ErrorCode::StoreWrite,
                StoreError::Scan { .. } => ErrorCode::StoreScan,
                StoreError::History { .. } => ErrorCode::StoreHistory,
            },
        }
    }

    /// Whether the caller may safely retry the same invocation unchanged.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

impl From<kyc_ledger_types::ValidationError> for EngineError {
    fn from(err: kyc_ledger_types::ValidationError) -> Self {
        Self::InvalidArgument { field: err.field, constraint: err.constraint }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping() {
        let err = EngineError::NotFound { id: "2026-000001".to_string() };
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.is_retryable());

        let err = EngineError::DuplicateKey { id: "2026-000001".to_string() };
        assert_eq!(err.code(), ErrorCode::DuplicateKey);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_validation_error_converts_to_invalid_argument() {
        let err: EngineError = kyc_ledger_types::ValidationError {
            field: "email".to_string(),
            constraint: "must not be empty".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::InvalidArgument { ref field, .. } if field == "email"));
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_already_in_state_display() {
        let err = EngineError::AlreadyInState { id: "2026-000001".to_string(), active: true };
        assert_eq!(err.to_string(), "record '2026-000001' is already active");
    }
}
