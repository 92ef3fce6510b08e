//! True/false defect classification
//!
//! Inspection data mixes automatic detector candidates with manual
//! verification outcomes. Safe codes mark confirmed false alarms or accepted
//! process variance; every other outcome, including unverified records, is a
//! true defect that counts against yield.

use std::collections::HashSet;

use crate::core::config::SAFE_VERIFICATION_VALUES;
use crate::entities::defect::DefectRecord;

/// Anything carrying a verification outcome
pub trait Verified {
    fn verification(&self) -> Option<&str>;
}

impl Verified for DefectRecord {
    fn verification(&self) -> Option<&str> {
        self.verification.as_deref()
    }
}

/// Canonical form of a verification code: trimmed, uppercase
pub fn normalize_verification(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Classifies verification outcomes against a set of safe codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectClassifier {
    safe_values: HashSet<String>,
}

impl Default for DefectClassifier {
    fn default() -> Self {
        Self::new(SAFE_VERIFICATION_VALUES)
    }
}

impl DefectClassifier {
    pub fn new<S: AsRef<str>>(safe_values: &[S]) -> Self {
        Self {
            safe_values: safe_values
                .iter()
                .map(|v| normalize_verification(v.as_ref()))
                .collect(),
        }
    }

    /// Whether a verification outcome is yield-impacting.
    ///
    /// Missing outcomes count as true defects.
    pub fn is_true_defect(&self, value: Option<&str>) -> bool {
        match value {
            None => true,
            Some(v) => !self.safe_values.contains(&normalize_verification(v)),
        }
    }

    /// Whether a code is in the safe set
    pub fn is_safe(&self, value: &str) -> bool {
        self.safe_values.contains(&normalize_verification(value))
    }

    /// Keep only the rows classified as true defects
    pub fn filter_true_defects<'a, T, I>(&self, rows: I) -> Vec<&'a T>
    where
        T: Verified + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        rows.into_iter()
            .filter(|row| self.is_true_defect(row.verification()))
            .collect()
    }
}
