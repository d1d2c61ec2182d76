//! Configuration for the ledger engine.
//!
//! All configuration is plain data loaded by the calling layer (TOML, env,
//! or hard-coded defaults) and validated after deserialization via
//! `validate()`. The defaults reproduce the scoring weights and identifier
//! format the network agreed on; changing them on a single node breaks
//! cross-node determinism, so deployments must roll them out uniformly.

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Configuration validation error.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[snafu(display("invalid config: {message}"))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Duplicate-screening weights and threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScoringConfig {
    /// Total score at or above which a candidate is flagged as a duplicate.
    pub duplicate_threshold: u32,
    /// Weight for an exact case-insensitive email match.
    pub email_weight: u32,
    /// Weight for an exact normalized first+last name match.
    pub name_exact_weight: u32,
    /// Weight for an exact date-of-birth match.
    pub birth_date_weight: u32,
    /// Weight when first or last name similarity reaches the cutoff.
    pub name_similarity_weight: u32,
    /// Weight when the face comparator reports the images similar.
    pub face_match_weight: u32,
    /// Name-similarity value at or above which the similarity rule fires.
    pub name_similarity_cutoff: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: 50,
            email_weight: 40,
            name_exact_weight: 10,
            birth_date_weight: 5,
            name_similarity_weight: 5,
            face_match_weight: 40,
            name_similarity_cutoff: 0.8,
        }
    }
}

impl ScoringConfig {
    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the threshold is zero, the cutoff is
    /// outside `(0, 1]`, or no combination of weights can reach the
    /// threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duplicate_threshold == 0 {
            return Err(ConfigError::Validation {
                message: "duplicate_threshold must be positive".to_string(),
            });
        }
        if !(self.name_similarity_cutoff > 0.0 && self.name_similarity_cutoff <= 1.0) {
            return Err(ConfigError::Validation {
                message: format!(
                    "name_similarity_cutoff {} must be in (0, 1]",
                    self.name_similarity_cutoff
                ),
            });
        }
        let max_total = self.email_weight
            + self.name_exact_weight
            + self.birth_date_weight
            + self.name_similarity_weight
            + self.face_match_weight;
        if max_total < self.duplicate_threshold {
            return Err(ConfigError::Validation {
                message: format!(
                    "duplicate_threshold {} is unreachable: weights sum to {}",
                    self.duplicate_threshold, max_total
                ),
            });
        }
        Ok(())
    }
}

/// Business-identifier format parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct IdentifierConfig {
    /// Zero-padded width of the trailing sequence number.
    pub sequence_width: usize,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self { sequence_width: 6 }
    }
}

impl IdentifierConfig {
    /// Validates the sequence width.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the width is zero or wider than the
    /// digits of `u64::MAX`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sequence_width == 0 {
            return Err(ConfigError::Validation {
                message: "sequence_width must be positive".to_string(),
            });
        }
        if self.sequence_width > 19 {
            return Err(ConfigError::Validation {
                message: format!("sequence_width {} exceeds maximum 19", self.sequence_width),
            });
        }
        Ok(())
    }
}

/// Field-size limits enforced at the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ValidationConfig {
    /// Maximum UTF-8 byte length of a person name component.
    pub max_name_bytes: usize,
    /// Maximum UTF-8 byte length of an email address.
    pub max_email_bytes: usize,
    /// Maximum UTF-8 byte length of an account number.
    pub max_account_number_bytes: usize,
    /// Maximum UTF-8 byte length of a bank name.
    pub max_bank_name_bytes: usize,
    /// Maximum UTF-8 byte length of a country name.
    pub max_country_name_bytes: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_name_bytes: 128,
            max_email_bytes: 254,
            max_account_number_bytes: 64,
            max_bank_name_bytes: 128,
            max_country_name_bytes: 64,
        }
    }
}

impl ValidationConfig {
    /// Validates that no limit is zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_name_bytes", self.max_name_bytes),
            ("max_email_bytes", self.max_email_bytes),
            ("max_account_number_bytes", self.max_account_number_bytes),
            ("max_bank_name_bytes", self.max_bank_name_bytes),
            ("max_country_name_bytes", self.max_country_name_bytes),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::Validation {
                    message: format!("{name} must be positive"),
                });
            }
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Duplicate-screening parameters.
    pub scoring: ScoringConfig,
    /// Identifier format parameters.
    pub identifier: IdentifierConfig,
    /// Field-size limits.
    pub validation: ValidationConfig,
}

impl EngineConfig {
    /// Validates all sections.
    ///
    /// # Errors
    ///
    /// Returns the first section [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.identifier.validate()?;
        self.validation.validate()?;
        Ok(())
    }
}
