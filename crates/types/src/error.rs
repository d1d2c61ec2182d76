//! Machine-readable error codes for the ledger core.
//!
//! Each failure the engine can surface maps to a unique numeric code with a
//! retryability classification, so the routing layer can make retry
//! decisions without string matching. Codes are organized into ranges:
//!
//! | Range       | Domain                                            |
//! |-------------|---------------------------------------------------|
//! | 1000–1099   | Store adapter (read, write, scan, history)        |
//! | 1100–1199   | Codec (encode, decode)                            |
//! | 2000–2099   | Input validation                                  |
//! | 3000–3099   | Business rules (existence, duplicates, lifecycle) |
//! | 3100–3199   | External oracle                                   |

/// Machine-readable error code for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // --- Store adapter (1000–1099) ---
    /// A point read against the world state failed.
    StoreRead = 1000,
    /// A write against the world state failed.
    StoreWrite = 1001,
    /// A range scan against the world state failed.
    StoreScan = 1002,
    /// Per-key history retrieval failed.
    StoreHistory = 1003,

    // --- Codec (1100–1199) ---
    /// Canonical encoding failed.
    EncodeFailed = 1100,
    /// Stored bytes failed to decode.
    DecodeFailed = 1101,

    // --- Input validation (2000–2099) ---
    /// An argument value is missing, empty, or out of range.
    InvalidArgument = 2000,
    /// An attribute update named a field outside the allow-list.
    ForbiddenField = 2001,
    /// A configuration value is invalid.
    ConfigInvalid = 2002,

    // --- Business rules (3000–3099) ---
    /// The addressed record does not exist.
    NotFound = 3000,
    /// A freshly generated identifier already exists in the store.
    DuplicateKey = 3001,
    /// The account number is already present on the record.
    DuplicateAccount = 3002,
    /// The country is already present on the record.
    DuplicateNationality = 3003,
    /// No account with the given number exists on the record.
    AccountNotFound = 3004,
    /// No nationality for the given country exists on the record.
    NationalityNotFound = 3005,
    /// Removal would leave the record without any nationality.
    LastNationality = 3006,
    /// The record is inactive and rejects account/nationality mutation.
    InactiveRecord = 3007,
    /// The record is already in the requested activation state.
    AlreadyInState = 3008,

    // --- External oracle (3100–3199) ---
    /// The face-similarity oracle could not produce a verdict.
    OracleUnavailable = 3100,
}

impl ErrorCode {
    /// Returns the numeric code for wire transmission.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Parses a numeric code back to its variant.
    pub const fn from_u16(code: u16) -> Option<Self> {
        Some(match code {
            1000 => Self::StoreRead,
            1001 => Self::StoreWrite,
            1002 => Self::StoreScan,
            1003 => Self::StoreHistory,
            1100 => Self::EncodeFailed,
            1101 => Self::DecodeFailed,
            2000 => Self::InvalidArgument,
            2001 => Self::ForbiddenField,
            2002 => Self::ConfigInvalid,
            3000 => Self::NotFound,
            3001 => Self::DuplicateKey,
            3002 => Self::DuplicateAccount,
            3003 => Self::DuplicateNationality,
            3004 => Self::AccountNotFound,
            3005 => Self::NationalityNotFound,
            3006 => Self::LastNationality,
            3007 => Self::InactiveRecord,
            3008 => Self::AlreadyInState,
            3100 => Self::OracleUnavailable,
            _ => return None,
        })
    }

    /// Whether the caller may safely retry the same invocation unchanged.
    ///
    /// Validation and not-found failures are safe to retry once inputs are
    /// corrected. `DuplicateKey` must not be blindly retried: the caller has
    /// to re-run identifier derivation first. Store failures are transient
    /// from the core's perspective; the platform decides.
    pub const fn is_retryable(self) -> bool {
        match self {
            Self::StoreRead | Self::StoreWrite | Self::StoreScan | Self::StoreHistory => true,
            Self::EncodeFailed | Self::DecodeFailed => false,
            Self::InvalidArgument | Self::ForbiddenField => true,
            Self::ConfigInvalid => false,
            Self::NotFound => true,
            Self::DuplicateKey => false,
            Self::DuplicateAccount
            | Self::DuplicateNationality
            | Self::AccountNotFound
            | Self::NationalityNotFound
            | Self::LastNationality
            | Self::InactiveRecord
            | Self::AlreadyInState => true,
            Self::OracleUnavailable => true,
        }
    }
}
