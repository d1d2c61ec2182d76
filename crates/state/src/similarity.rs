//! Duplicate-likelihood scoring.
//!
//! A candidate record is scored against every existing client record
//! (active or inactive) with additive weighted rules; any existing record
//! whose total reaches the configured threshold flags the candidate as a
//! probable duplicate.
//!
//! The name-similarity metric is a fixed algorithm, not an approximation:
//! it must be reproduced exactly on every execution node or duplicate
//! detection diverges. See [`name_similarity`].
//!
//! Face similarity is consumed from an injected [`FaceComparator`], never
//! fetched over the network inside the transaction. The shipped production
//! implementation is [`PrecomputedVerdicts`]: the calling layer compares
//! image pairs before submitting the transaction and passes the verdict
//! table as an argument. A pair the comparator cannot answer surfaces as
//! [`OracleError`] and aborts screening rather than being silently treated
//! as "not similar".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use kyc_ledger_types::{ClientRecord, ImageRef, NewClientRecord, RecordId, ScoringConfig};

use crate::error::{OracleUnavailableSnafu, Result};

/// Verdict of a face comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceVerdict {
    /// Whether the two images depict the same person.
    pub is_similar: bool,
}

/// The face comparator could not produce a verdict.
#[derive(Debug, Snafu)]
#[snafu(display("face comparator could not answer for ({candidate}, {existing}): {message}"))]
pub struct OracleError {
    /// Candidate image reference.
    pub candidate: String,
    /// Existing image reference.
    pub existing: String,
    /// Comparator-supplied failure description.
    pub message: String,
}

/// Injected face-similarity dependency.
///
/// Implementations must be deterministic for the duration of one
/// invocation: the same pair always yields the same verdict.
pub trait FaceComparator {
    /// Compares a candidate image against an existing record's image.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if no verdict can be produced; the engine
    /// aborts creation rather than defaulting to "not similar".
    fn compare(&self, candidate: &ImageRef, existing: &ImageRef) -> Result<FaceVerdict, OracleError>;
}

/// Verdict table filled by the calling layer before the transaction.
///
/// Keyed by `(candidate_ref, existing_ref)`. A lookup miss is an oracle
/// failure, not a negative verdict.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedVerdicts {
    verdicts: HashMap<(String, String), bool>,
}

impl PrecomputedVerdicts {
    /// Creates an empty verdict table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the verdict for an image pair.
    pub fn insert(&mut self, candidate: &ImageRef, existing: &ImageRef, is_similar: bool) {
        self.verdicts
            .insert((candidate.as_str().to_string(), existing.as_str().to_string()), is_similar);
    }
}

impl FaceComparator for PrecomputedVerdicts {
    fn compare(&self, candidate: &ImageRef, existing: &ImageRef) -> Result<FaceVerdict, OracleError> {
        match self.verdicts.get(&(candidate.as_str().to_string(), existing.as_str().to_string())) {
            Some(&is_similar) => Ok(FaceVerdict { is_similar }),
            None => Err(OracleError {
                candidate: candidate.as_str().to_string(),
                existing: existing.as_str().to_string(),
                message: "no precomputed verdict for this pair".to_string(),
            }),
        }
    }
}

/// Normalizes a name for comparison: diacritics stripped, lower-cased,
/// alphanumeric characters only.
pub fn normalize_name(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Computes the fixed name-similarity metric on two raw names.
///
/// Both inputs are normalized, then three sub-scores are formed, each
/// divided by the longer normalized length:
///
/// - longest common subsequence length,
/// - characters matched in order by a single forward two-pointer scan,
/// - positions holding identical characters.
///
/// They combine as `0.4*lcs + 0.3*order + 0.3*position`, plus a flat `0.1`
/// when the first characters match; the sum is raised to the power `1.5`
/// and rounded to two decimals. Two empty names score `0.0`.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize_name(a).chars().collect();
    let b: Vec<char> = normalize_name(b).chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 0.0;
    }
    let max_len = max_len as f64;

    let lcs_score = lcs_length(&a, &b) as f64 / max_len;
    let order_score = in_order_matches(&a, &b) as f64 / max_len;
    let position_score =
        a.iter().zip(b.iter()).filter(|(x, y)| x == y).count() as f64 / max_len;

    let mut combined = 0.4 * lcs_score + 0.3 * order_score + 0.3 * position_score;
    if let (Some(first_a), Some(first_b)) = (a.first(), b.first()) {
        if first_a == first_b {
            combined += 0.1;
        }
    }
    round2(combined.powf(1.5))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn lcs_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // One-row DP over the shorter dimension is unnecessary at name lengths.
    let mut prev = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// Counts characters of `a` matched in order within `b` by one forward scan
/// of both sequences.
fn in_order_matches(a: &[char], b: &[char]) -> usize {
    let mut count = 0;
    let mut j = 0;
    for &ca in a {
        while j < b.len() && b[j] != ca {
            j += 1;
        }
        if j < b.len() {
            count += 1;
            j += 1;
        }
    }
    count
}

/// One existing record that met the duplicate threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityMatch {
    /// Identifier of the matching existing record.
    pub record_id: RecordId,
    /// Total additive score against the candidate.
    pub score: u32,
    /// One reason per rule that fired.
    pub reasons: Vec<String>,
}

/// Weighted duplicate-likelihood scorer.
pub struct SimilarityScorer<'a> {
    config: &'a ScoringConfig,
    comparator: &'a dyn FaceComparator,
}

impl<'a> SimilarityScorer<'a> {
    /// Creates a scorer over the given weights and face comparator.
    pub fn new(config: &'a ScoringConfig, comparator: &'a dyn FaceComparator) -> Self {
        Self { config, comparator }
    }

    /// Scores the candidate against one existing record.
    ///
    /// Rules are additive; each fires at most once. The face rule is only
    /// evaluated when both sides carry an image reference.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::OracleUnavailable` if the comparator cannot
    /// answer for an image pair.
    pub fn score_pair(
        &self,
        candidate: &NewClientRecord,
        existing: &ClientRecord,
    ) -> Result<(u32, Vec<String>)> {
        let mut score = 0;
        let mut reasons = Vec::new();

        if candidate.email.trim().to_lowercase() == existing.email.trim().to_lowercase() {
            score += self.config.email_weight;
            reasons.push("identical email".to_string());
        }

        let candidate_name =
            normalize_name(&candidate.first_name) + &normalize_name(&candidate.last_name);
        let existing_name =
            normalize_name(&existing.first_name) + &normalize_name(&existing.last_name);
        if candidate_name == existing_name && !candidate_name.is_empty() {
            score += self.config.name_exact_weight;
            reasons.push("identical normalized name".to_string());
        }

        if candidate.date_of_birth == existing.date_of_birth {
            score += self.config.birth_date_weight;
            reasons.push("identical date of birth".to_string());
        }

        let first_similarity = name_similarity(&candidate.first_name, &existing.first_name);
        let last_similarity = name_similarity(&candidate.last_name, &existing.last_name);
        if first_similarity >= self.config.name_similarity_cutoff
            || last_similarity >= self.config.name_similarity_cutoff
        {
            score += self.config.name_similarity_weight;
            reasons.push(format!(
                "similar name (first {first_similarity:.2}, last {last_similarity:.2})"
            ));
        }

        if let (Some(candidate_ref), Some(existing_ref)) =
            (&candidate.face_image_ref, &existing.face_image_ref)
        {
            let verdict = self
                .comparator
                .compare(candidate_ref, existing_ref)
                .context(OracleUnavailableSnafu)?;
            if verdict.is_similar {
                score += self.config.face_match_weight;
                reasons.push("similar face image".to_string());
            }
        }

        Ok((score, reasons))
    }

    /// Screens the candidate against every existing record, returning all
    /// records at or above the duplicate threshold.
    ///
    /// Order is stable within one evaluation: descending score, ties broken
    /// by record id ascending.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::OracleUnavailable` if any comparison cannot be
    /// answered; screening aborts rather than under-reporting.
    pub fn screen<'r>(
        &self,
        candidate: &NewClientRecord,
        existing: impl IntoIterator<Item = &'r ClientRecord>,
    ) -> Result<Vec<SimilarityMatch>> {
        let mut matches = Vec::new();
        for record in existing {
            let (score, reasons) = self.score_pair(candidate, record)?;
            if score >= self.config.duplicate_threshold {
                matches.push(SimilarityMatch { record_id: record.id.clone(), score, reasons });
            }
        }
        matches.sort_by(|x, y| {
            y.score.cmp(&x.score).then_with(|| x.record_id.cmp(&y.record_id))
        });
        Ok(matches)
    }
}
