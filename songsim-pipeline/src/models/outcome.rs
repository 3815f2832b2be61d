//! Tagged extraction outcomes
//!
//! Every field and every file gets an explicit outcome so fallback and skip
//! rates are countable instead of only visible in log lines.

use crate::extractors::FieldError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Why a fallback value was substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    MissingPath,
    DecodeError,
    MalformedShape,
}

impl From<&FieldError> for FallbackReason {
    fn from(error: &FieldError) -> Self {
        match error {
            FieldError::MissingPath(_) => Self::MissingPath,
            FieldError::DecodeError(_, _) => Self::DecodeError,
            FieldError::MalformedShape(_, _) => Self::MalformedShape,
        }
    }
}

/// Outcome of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    Extracted,
    Fallback(FallbackReason),
}

impl FieldOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Why a whole file produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// File could not be opened or read
    Unreadable,
    /// File is not a valid document
    InvalidDocument,
    /// Resolved song_id was already produced by an earlier file
    DuplicateSongId,
}

/// Outcome of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Every field extracted from the source
    Success,
    /// At least one field was absent and fell back
    MissingField,
    /// At least one field failed to decode or had the wrong shape
    DecodeFailure,
    /// No record produced
    Skipped(SkipReason),
}

impl FileOutcome {
    /// Classify a record's field outcomes
    ///
    /// Decode and shape failures outrank missing paths.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a FieldOutcome>) -> Self {
        let mut outcome = Self::Success;
        for field in fields {
            match field {
                FieldOutcome::Extracted => {}
                FieldOutcome::Fallback(FallbackReason::MissingPath) => {
                    if outcome == Self::Success {
                        outcome = Self::MissingField;
                    }
                }
                FieldOutcome::Fallback(_) => outcome = Self::DecodeFailure,
            }
        }
        outcome
    }

    pub fn produced_record(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Counts of file and field outcomes for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub success: usize,
    pub missing_field: usize,
    pub decode_failure: usize,
    pub skipped: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
    /// field name → reason → count
    pub fallbacks: BTreeMap<String, BTreeMap<FallbackReason, usize>>,
}

impl OutcomeTally {
    pub fn record_file(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Success => self.success += 1,
            FileOutcome::MissingField => self.missing_field += 1,
            FileOutcome::DecodeFailure => self.decode_failure += 1,
            FileOutcome::Skipped(reason) => {
                self.skipped += 1;
                *self.skipped_by_reason.entry(reason).or_insert(0) += 1;
            }
        }
    }

    pub fn record_fallback(&mut self, field: &str, reason: FallbackReason) {
        *self
            .fallbacks
            .entry(field.to_string())
            .or_default()
            .entry(reason)
            .or_insert(0) += 1;
    }

    /// Files that produced a record
    pub fn produced(&self) -> usize {
        self.success + self.missing_field + self.decode_failure
    }

    /// Total fallback substitutions across all fields
    pub fn total_fallbacks(&self) -> usize {
        self.fallbacks.values().flat_map(|m| m.values()).sum()
    }
}
