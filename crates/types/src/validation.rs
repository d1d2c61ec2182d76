//! Field-level input validation.
//!
//! Used at the engine boundary before any store read or write happens: a
//! validation failure aborts the invocation with no partial write. All
//! checks operate on trimmed values; a string of only whitespace counts as
//! empty.

use std::fmt;

use crate::config::ValidationConfig;
use crate::record::{Account, Nationality};

/// Validation error with structured context.
///
/// Contains the field that failed and the violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the violated constraint.
    pub constraint: String,
}

impl ValidationError {
    fn new(field: &str, constraint: impl Into<String>) -> Self {
        Self { field: field.to_string(), constraint: constraint.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

fn require_non_empty(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

fn require_max_bytes(value: &str, field: &str, max: usize) -> Result<(), ValidationError> {
    if value.len() > max {
        return Err(ValidationError::new(
            field,
            format!("length {} bytes exceeds maximum {} bytes", value.len(), max),
        ));
    }
    Ok(())
}

/// Validates a person name component (first or last name).
///
/// # Errors
///
/// Returns [`ValidationError`] if the name is empty after trimming or
/// exceeds `config.max_name_bytes`.
pub fn validate_person_name(
    value: &str,
    field: &str,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    require_non_empty(value, field)?;
    require_max_bytes(value, field, config.max_name_bytes)
}

/// Validates an email address.
///
/// Only shape is checked (one `@` with text on both sides); full RFC 5322
/// parsing is the routing layer's concern.
///
/// # Errors
///
/// Returns [`ValidationError`] if the email is empty, exceeds
/// `config.max_email_bytes`, or lacks a local part or domain.
pub fn validate_email(value: &str, config: &ValidationConfig) -> Result<(), ValidationError> {
    require_non_empty(value, "email")?;
    require_max_bytes(value, "email", config.max_email_bytes)?;
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::new("email", "must have the form local@domain")),
    }
}

/// Validates an account's number and bank name.
///
/// # Errors
///
/// Returns [`ValidationError`] if either field is empty after trimming or
/// exceeds its configured byte limit.
pub fn validate_account(
    account: &Account,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    require_non_empty(&account.account_number, "accountNumber")?;
    require_max_bytes(&account.account_number, "accountNumber", config.max_account_number_bytes)?;
    require_non_empty(&account.bank_name, "bankName")?;
    require_max_bytes(&account.bank_name, "bankName", config.max_bank_name_bytes)
}

/// Validates a nationality's country name and identity document.
///
/// # Errors
///
/// Returns [`ValidationError`] if the country name, document type, or
/// document number is empty after trimming, or the country name exceeds
/// `config.max_country_name_bytes`.
pub fn validate_nationality(
    nationality: &Nationality,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    require_non_empty(&nationality.country_name, "countryName")?;
    require_max_bytes(&nationality.country_name, "countryName", config.max_country_name_bytes)?;
    require_non_empty(&nationality.id_document.doc_type, "idDocument.type")?;
    require_non_empty(&nationality.id_document.number, "idDocument.number")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::record::IdDocument;

    fn config() -> ValidationConfig {
        ValidationConfig::default()
    }

    fn nationality(country: &str) -> Nationality {
        Nationality {
            country_name: country.to_string(),
            id_document: IdDocument {
                doc_type: "passport".to_string(),
                number: "P-1".to_string(),
                image_ref: None,
            },
        }
    }

    // =========================================================================
    // validate_person_name tests
    // =========================================================================

    #[test]
    fn test_person_name_valid() {
        assert!(validate_person_name("Ada", "firstName", &config()).is_ok());
    }

    #[test]
    fn test_person_name_empty() {
        let err = validate_person_name("", "firstName", &config()).unwrap_err();
        assert_eq!(err.field, "firstName");
        assert!(err.constraint.contains("empty"));
    }

    #[test]
    fn test_person_name_whitespace_only() {
        let err = validate_person_name("   ", "lastName", &config()).unwrap_err();
        assert_eq!(err.field, "lastName");
        assert!(err.constraint.contains("empty"));
    }

    #[test]
    fn test_person_name_over_limit() {
        let cfg = ValidationConfig { max_name_bytes: 4, ..ValidationConfig::default() };
        let err = validate_person_name("Adaline", "firstName", &cfg).unwrap_err();
        assert!(err.constraint.contains("exceeds maximum"));
    }

    // =========================================================================
    // validate_email tests
    // =========================================================================

    #[test]
    fn test_email_valid() {
        assert!(validate_email("ada@example.com", &config()).is_ok());
    }

    #[test]
    fn test_email_missing_at() {
        let err = validate_email("ada.example.com", &config()).unwrap_err();
        assert!(err.constraint.contains("local@domain"));
    }

    #[test]
    fn test_email_empty_local_part() {
        assert!(validate_email("@example.com", &config()).is_err());
        assert!(validate_email("ada@", &config()).is_err());
    }

    #[test]
    fn test_email_empty() {
        let err = validate_email("", &config()).unwrap_err();
        assert!(err.constraint.contains("empty"));
    }

    // =========================================================================
    // validate_account tests
    // =========================================================================

    #[test]
    fn test_account_valid() {
        let account = Account {
            account_number: "ACC1".to_string(),
            bank_name: "BankX".to_string(),
        };
        assert!(validate_account(&account, &config()).is_ok());
    }

    #[test]
    fn test_account_empty_number() {
        let account = Account { account_number: "  ".to_string(), bank_name: "BankX".to_string() };
        let err = validate_account(&account, &config()).unwrap_err();
        assert_eq!(err.field, "accountNumber");
    }

    #[test]
    fn test_account_empty_bank_name() {
        let account = Account { account_number: "ACC1".to_string(), bank_name: String::new() };
        let err = validate_account(&account, &config()).unwrap_err();
        assert_eq!(err.field, "bankName");
    }

    // =========================================================================
    // validate_nationality tests
    // =========================================================================

    #[test]
    fn test_nationality_valid() {
        assert!(validate_nationality(&nationality("France"), &config()).is_ok());
    }

    #[test]
    fn test_nationality_empty_country() {
        let err = validate_nationality(&nationality(" "), &config()).unwrap_err();
        assert_eq!(err.field, "countryName");
    }

    #[test]
    fn test_nationality_empty_document_number() {
        let mut n = nationality("France");
        n.id_document.number = String::new();
        let err = validate_nationality(&n, &config()).unwrap_err();
        assert_eq!(err.field, "idDocument.number");
    }
}
