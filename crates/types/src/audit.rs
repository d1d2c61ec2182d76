//! In-record audit journal types.
//!
//! Every state transition appends exactly one [`AuditEntry`] describing
//! itself: who acted, when, what was done, and an optional human-readable
//! detail. The journal is append-only and independent of (but logically
//! aligned with) the store's own per-key history mechanism.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The action an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Record created.
    Create,
    /// Record read with access auditing enabled.
    Read,
    /// One or more identity attributes updated.
    UpdateAttributes,
    /// Record reactivated.
    Activate,
    /// Record deactivated.
    Deactivate,
    /// Bank account added.
    AddAccount,
    /// Bank account removed.
    RemoveAccount,
    /// Nationality added.
    AddNationality,
    /// Nationality removed.
    RemoveNationality,
}

impl AuditAction {
    /// Returns the action as its stored string label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::UpdateAttributes => "UPDATE_ATTRIBUTES",
            Self::Activate => "ACTIVATE",
            Self::Deactivate => "DEACTIVATE",
            Self::AddAccount => "ADD_ACCOUNT",
            Self::RemoveAccount => "REMOVE_ACCOUNT",
            Self::AddNationality => "ADD_NATIONALITY",
            Self::RemoveNationality => "REMOVE_NATIONALITY",
        }
    }
}

/// One entry of the in-record audit journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Organization that performed the action.
    pub organization_id: String,
    /// Deterministic transaction timestamp of the action.
    pub timestamp: DateTime<Utc>,
    /// What was done.
    pub action: AuditAction,
    /// Optional detail naming the affected account, nationality, or fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEntry {
    /// Creates an entry without detail text.
    pub fn new(
        organization_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        action: AuditAction,
    ) -> Self {
        Self { organization_id: organization_id.into(), timestamp, action, detail: None }
    }

    /// Creates an entry with detail text.
    pub fn with_detail(
        organization_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        action: AuditAction,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            timestamp,
            action,
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::DateTime;

    use super::*;

    #[test]
    fn test_action_serializes_as_screaming_snake() {
        let value = serde_json::to_value(AuditAction::AddAccount).unwrap();
        assert_eq!(value, "ADD_ACCOUNT");
        assert_eq!(AuditAction::AddAccount.as_str(), "ADD_ACCOUNT");
    }

    #[test]
    fn test_action_labels_match_serialization() {
        let actions = [
            AuditAction::Create,
            AuditAction::Read,
            AuditAction::UpdateAttributes,
            AuditAction::Activate,
            AuditAction::Deactivate,
            AuditAction::AddAccount,
            AuditAction::RemoveAccount,
            AuditAction::AddNationality,
            AuditAction::RemoveNationality,
        ];
        for action in actions {
            let value = serde_json::to_value(action).unwrap();
            assert_eq!(value, action.as_str());
        }
    }

    #[test]
    fn test_detail_omitted_when_absent() {
        let ts = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z").unwrap().to_utc();
        let entry = AuditEntry::new("org1", ts, AuditAction::Create);
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("detail").is_none());

        let entry = AuditEntry::with_detail("org1", ts, AuditAction::AddAccount, "ACC1 at BankX");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value.get("detail").unwrap(), "ACC1 at BankX");
    }
}
