// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Enforcement Report
//!
//! The "Report Card" produced by every contract application. It is returned
//! alongside the cleaned batch no matter how many anomalies were found, so
//! the caller decides whether to proceed, alert, or abort.

use crate::domain::contract::ColumnKind;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of evaluating a derived column.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivationStatus {
    Derived,
    /// The named dependency column was absent from the batch.
    FailedMissingDep(String),
    /// The derivation ran but its output could not be used.
    Failed(String),
}

impl fmt::Display for DerivationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivationStatus::Derived => write!(f, "derived"),
            DerivationStatus::FailedMissingDep(dep) => write!(f, "failed_missing_dep:{}", dep),
            DerivationStatus::Failed(reason) => write!(f, "failed:{}", reason),
        }
    }
}

impl Serialize for DerivationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Per-call diagnostics of the enforcement engine.
#[derive(Debug, Clone, Serialize)]
pub struct EnforcementReport {
    pub table: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_out: usize,
    pub missing_required_columns: Vec<String>,
    pub type_coercions: BTreeMap<String, ColumnKind>,
    pub invalid_bounds: BTreeMap<String, usize>,
    pub derived_columns: BTreeMap<String, DerivationStatus>,
    pub rule_violations: BTreeMap<String, usize>,
    pub not_nullable_violations: BTreeMap<String, usize>,
    pub duplicates_dropped: usize,
    /// Bounded sample of duplicated primary-key tuples.
    pub duplicate_key_sample: Vec<String>,
}

impl EnforcementReport {
    pub fn new(table: &str, rows_in: usize) -> Self {
        Self {
            table: table.to_string(),
            rows_in,
            rows_out: 0,
            columns_out: 0,
            missing_required_columns: Vec::new(),
            type_coercions: BTreeMap::new(),
            invalid_bounds: BTreeMap::new(),
            derived_columns: BTreeMap::new(),
            rule_violations: BTreeMap::new(),
            not_nullable_violations: BTreeMap::new(),
            duplicates_dropped: 0,
            duplicate_key_sample: Vec::new(),
        }
    }

    /// Adds counts from one rule; labels shared across rules accumulate.
    pub fn add_violations(&mut self, violations: &BTreeMap<String, usize>) {
        for (label, count) in violations {
            *self.rule_violations.entry(label.clone()).or_insert(0) += count;
        }
    }

    pub fn total_bound_violations(&self) -> usize {
        self.invalid_bounds.values().sum()
    }

    pub fn total_rule_violations(&self) -> usize {
        self.rule_violations.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violations_accumulate_across_rules() {
        let mut report = EnforcementReport::new("statcast_pitches", 10);
        let first = BTreeMap::from([("sz_inverted".to_string(), 2)]);
        let second = BTreeMap::from([
            ("sz_inverted".to_string(), 1),
            ("effective_speed_invalid".to_string(), 4),
        ]);
        report.add_violations(&first);
        report.add_violations(&second);

        assert_eq!(report.rule_violations["sz_inverted"], 3);
        assert_eq!(report.total_rule_violations(), 7);
    }

    #[test]
    fn test_derivation_status_serializes_as_label() {
        let status = DerivationStatus::FailedMissingDep("description".to_string());
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            "\"failed_missing_dep:description\""
        );
        assert_eq!(DerivationStatus::Derived.to_string(), "derived");
    }
}
