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

//! # Table Contracts
//!
//! A contract is the declarative "Blueprint" for one warehouse table: which
//! columns it has, what kind of value each column holds, which values are
//! physically plausible, and which columns are computed from others.
//!
//! Contracts are plain immutable data. Derivations, table rules and row
//! filters are stored as `fn` pointers (not closures) so a contract never
//! captures outer state and can always be inspected or listed.

use crate::domain::errors::{DeriveError, LoadError, Result};
use arrow::array::{ArrayRef, BooleanArray};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The semantic type of a column. Every kind has exactly one coercion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Int64,
    Int16,
    Float64,
    Text,
    Boolean,
    Date,
    Timestamp,
    Uuid,
    Json,
}

impl ColumnKind {
    /// Bounds only make sense for kinds that hold numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Int64 | ColumnKind::Int16 | ColumnKind::Float64)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Int64 => "int64",
            ColumnKind::Int16 => "int16",
            ColumnKind::Float64 => "float64",
            ColumnKind::Text => "text",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Uuid => "uuid",
            ColumnKind::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// Computes one column from the current state of a batch.
pub type DeriveFn = fn(&RecordBatch) -> std::result::Result<ArrayRef, DeriveError>;

/// Cross-column check. May null out cells and returns violation counts by label.
pub type TableRule = fn(RecordBatch) -> Result<RuleOutcome>;

/// Produces a keep-mask for the rows of a batch.
pub type RowFilter = fn(&RecordBatch) -> Result<BooleanArray>;

/// What a table rule hands back: the (possibly mutated) batch and its counts.
#[derive(Debug)]
pub struct RuleOutcome {
    pub batch: RecordBatch,
    pub violations: BTreeMap<String, usize>,
}

/// Declarative description of a single column.
#[derive(Clone)]
pub struct ColumnContract {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
    /// Inclusive `(low, high)`; values outside become null.
    pub bounds: Option<(f64, f64)>,
    pub derive: Option<DeriveFn>,
    /// Legacy source name, renamed once when the canonical name is absent.
    pub original_name: Option<String>,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub server_default: Option<String>,
}

impl ColumnContract {
    /// A nullable column of the given kind with no extra rules.
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            nullable: true,
            bounds: None,
            derive: None,
            original_name: None,
            is_primary_key: false,
            is_identity: false,
            server_default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn bounds(mut self, low: f64, high: f64) -> Self {
        self.bounds = Some((low, high));
        self
    }

    pub fn derived(mut self, derive: DeriveFn) -> Self {
        self.derive = Some(derive);
        self
    }

    pub fn renamed_from(mut self, original_name: &str) -> Self {
        self.original_name = Some(original_name.to_string());
        self
    }

    /// Marks the column as part of the key. Key columns are always required.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    pub fn server_default(mut self, expr: &str) -> Self {
        self.server_default = Some(expr.to_string());
        self
    }
}

impl fmt::Debug for ColumnContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnContract")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("bounds", &self.bounds)
            .field("derived", &self.derive.is_some())
            .field("original_name", &self.original_name)
            .field("is_primary_key", &self.is_primary_key)
            .finish()
    }
}

/// The full contract for one destination table.
#[derive(Clone)]
pub struct TableContract {
    pub name: String,
    pub primary_key: Vec<String>,
    /// Declaration order matters: derivations run in this order.
    pub columns: Vec<ColumnContract>,
    pub table_rules: Vec<TableRule>,
    pub row_filters: Vec<RowFilter>,
}

impl TableContract {
    /// Builds and validates a contract.
    ///
    /// Fails when the key is empty, when a key column is not declared, or
    /// when two columns share a name.
    pub fn new(name: &str, primary_key: &[&str], columns: Vec<ColumnContract>) -> Result<Self> {
        let contract = Self {
            name: name.to_string(),
            primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
            columns,
            table_rules: Vec::new(),
            row_filters: Vec::new(),
        };
        contract.validate()?;
        Ok(contract)
    }

    pub fn with_rules(mut self, rules: Vec<TableRule>) -> Self {
        self.table_rules = rules;
        self
    }

    pub fn with_filters(mut self, filters: Vec<RowFilter>) -> Self {
        self.row_filters = filters;
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnContract> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| LoadError::ContractError {
            table: self.name.clone(),
            reason,
        };

        if self.primary_key.is_empty() {
            return Err(invalid("primary key must name at least one column".to_string()));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(invalid(format!("column '{}' declared twice", col.name)));
            }
        }

        for key in &self.primary_key {
            if !seen.contains(key.as_str()) {
                return Err(invalid(format!(
                    "primary key column '{}' is not declared",
                    key
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TableContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableContract")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("columns", &self.columns.len())
            .field("table_rules", &self.table_rules.len())
            .field("row_filters", &self.row_filters.len())
            .finish()
    }
}

/// Merges column groups. A later entry with an existing name replaces the
/// earlier one in place, so the first declaration position is retained.
pub fn merge_columns(groups: &[Vec<ColumnContract>]) -> Vec<ColumnContract> {
    let mut merged: Vec<ColumnContract> = Vec::new();
    for group in groups {
        for col in group {
            match merged.iter_mut().find(|c| c.name == col.name) {
                Some(existing) => *existing = col.clone(),
                None => merged.push(col.clone()),
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_rejects_undeclared_key() {
        let err = TableContract::new(
            "dim_team",
            &["team_id"],
            vec![ColumnContract::new("team_name", ColumnKind::Text)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("team_id"));
    }

    #[test]
    fn test_contract_rejects_duplicate_columns() {
        let result = TableContract::new(
            "dim_team",
            &["team_id"],
            vec![
                ColumnContract::new("team_id", ColumnKind::Int64).primary_key(),
                ColumnContract::new("team_id", ColumnKind::Int16),
            ],
        );
        assert!(matches!(result, Err(LoadError::ContractError { .. })));
    }

    #[test]
    fn test_merge_keeps_first_position_with_latest_definition() {
        let common = vec![
            ColumnContract::new("game_pk", ColumnKind::Int64).primary_key(),
            ColumnContract::new("pitch_number", ColumnKind::Int16),
        ];
        let overrides = vec![
            ColumnContract::new("inning", ColumnKind::Int16),
            ColumnContract::new("pitch_number", ColumnKind::Int64).bounds(1.0, 135.0),
        ];

        let merged = merge_columns(&[common, overrides]);
        let names: Vec<&str> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["game_pk", "pitch_number", "inning"]);
        assert_eq!(merged[1].kind, ColumnKind::Int64);
        assert_eq!(merged[1].bounds, Some((1.0, 135.0)));
    }

    #[test]
    fn test_primary_key_columns_are_required() {
        let col = ColumnContract::new("game_pk", ColumnKind::Int64).primary_key();
        assert!(!col.nullable);
        assert!(col.is_primary_key);
    }
}
