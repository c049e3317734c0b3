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

//! # Domain Entities
//!
//! The "Nouns" of the load path: the destination we write into, the columns
//! it physically has, and the summary we hand back once a table is loaded.

use crate::domain::report::EnforcementReport;
use serde::{Deserialize, Serialize};

/// `DestinationColumn` is one column that currently exists in a warehouse table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationColumn {
    pub name: String,
    /// The database's own type name (e.g. `int8`, `float4`, `timestamptz`).
    pub sql_type: String,
}

impl DestinationColumn {
    pub fn new(name: &str, sql_type: &str) -> Self {
        Self {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
        }
    }
}

/// `LoadTarget` names where a batch goes and how conflicts are resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTarget {
    pub schema: String,
    pub table: String,
    /// Named unique constraint used by the ON CONFLICT clause.
    pub constraint: String,
    pub primary_key: Vec<String>,
    /// Identity / server-default columns; omitted from a chunk when all null.
    #[serde(default)]
    pub defaulted_columns: Vec<String>,
}

impl LoadTarget {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// `LoadSummary` is the outcome of one `transform_and_load` call.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub key: String,
    pub destination: String,
    pub rows_loaded: u64,
    pub db_columns: usize,
    pub duration: f64,
    /// Either "SUCCESS" or "FAILED".
    pub status: String,
    pub error: Option<String>,
    pub report: Option<EnforcementReport>,
}

impl LoadSummary {
    pub fn success(
        key: &str,
        destination: String,
        rows_loaded: u64,
        db_columns: usize,
        duration: f64,
        report: EnforcementReport,
    ) -> Self {
        Self {
            key: key.to_string(),
            destination,
            rows_loaded,
            db_columns,
            duration,
            status: "SUCCESS".to_string(),
            error: None,
            report: Some(report),
        }
    }

    pub fn failure(key: &str, destination: String, error: String) -> Self {
        Self {
            key: key.to_string(),
            destination,
            rows_loaded: 0,
            db_columns: 0,
            duration: 0.0,
            status: "FAILED".to_string(),
            error: Some(error),
            report: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}
