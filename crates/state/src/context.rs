//! Execution context of one state-transition invocation.
//!
//! Every value here is derived deterministically from the enclosing ledger
//! transaction by the platform: the timestamp is the transaction's, never a
//! local wall clock, so independent execution nodes stamp identical audit
//! entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Identity and timing of the enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionContext {
    tx_id: String,
    caller_organization_id: String,
    timestamp: DateTime<Utc>,
}

impl TransactionContext {
    /// Creates a context from platform-supplied transaction data.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` if the transaction id or
    /// caller organization id is empty after trimming.
    pub fn new(
        tx_id: impl Into<String>,
        caller_organization_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let tx_id = tx_id.into();
        let caller_organization_id = caller_organization_id.into();
        if tx_id.trim().is_empty() {
            return Err(EngineError::InvalidArgument {
                field: "txId".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }
        if caller_organization_id.trim().is_empty() {
            return Err(EngineError::InvalidArgument {
                field: "callerOrganizationId".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }
        Ok(Self { tx_id, caller_organization_id, timestamp })
    }

    /// The enclosing transaction's identifier.
    pub fn transaction_id(&self) -> &str {
        &self.tx_id
    }

    /// The organization invoking the transaction.
    pub fn caller_organization_id(&self) -> &str {
        &self.caller_organization_id
    }

    /// The deterministic transaction timestamp.
    pub fn transaction_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The identifier period derived from the transaction timestamp (the
    /// four-digit year).
    pub fn period(&self) -> String {
        self.timestamp.format("%Y").to_string()
    }
}
