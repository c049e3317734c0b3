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

//! Core error definitions for the warehouse loader.
//!
//! This module provides a centralized `LoadError` enum and a `Result` type
//! used throughout the application. Data-quality anomalies never show up
//! here: they are degraded to nulls and counted in the enforcement report.
//! Only structural problems (missing or null key columns), contract
//! definition mistakes, and destination failures become errors.

use thiserror::Error;

/// Error types encountered while validating and loading a batch.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid contract for {table}: {reason}")]
    ContractError { table: String, reason: String },

    #[error("Missing primary key columns for {table}: {missing:?}. Available columns: {available:?}")]
    MissingPrimaryKey {
        table: String,
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("{count} rows with nulls in primary key columns {primary_key:?} of {table}; sample: {sample:?}")]
    NullPrimaryKey {
        table: String,
        primary_key: Vec<String>,
        count: usize,
        sample: Vec<String>,
    },

    #[error("Destination metadata lookup failed: {0}")]
    MetadataError(String),

    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("Builder failed for {table}: {reason}")]
    BuilderError { table: String, reason: String },

    #[error("Database error [{code}]: {message}")]
    DatabaseError {
        code: String,
        message: String,
        detail: Option<String>,
        hint: Option<String>,
    },

    #[error("Upsert into {table} failed for batch starting at row {offset} (ON CONFLICT target {conflict_target:?}): {source}")]
    BatchFailed {
        table: String,
        offset: usize,
        conflict_target: Vec<String>,
        #[source]
        source: Box<LoadError>,
    },

    #[error("Transform '{name}' failed: {source}")]
    TransformFailed {
        name: String,
        #[source]
        source: Box<LoadError>,
    },

    #[error("Columnar error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<postgres::Error> for LoadError {
    fn from(e: postgres::Error) -> Self {
        match e.as_db_error() {
            Some(db) => LoadError::DatabaseError {
                code: db.code().code().to_string(),
                message: db.message().to_string(),
                detail: db.detail().map(str::to_string),
                hint: db.hint().map(str::to_string),
            },
            None => LoadError::DatabaseError {
                code: "CONNECTION".to_string(),
                message: e.to_string(),
                detail: None,
                hint: None,
            },
        }
    }
}

/// Raised by a column derivation when one of its inputs is absent.
///
/// The enforcement engine turns this into a `failed_missing_dep:<name>`
/// report entry and skips the column; it never fails the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeriveError {
    #[error("missing dependency column '{0}'")]
    MissingDependency(String),

    #[error("derivation produced {got} values for {expected} rows")]
    LengthMismatch { expected: usize, got: usize },
}

/// A specialized Result type for the warehouse loader.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failure_message_carries_context() {
        let err = LoadError::BatchFailed {
            table: "staging.statcast_pitches".to_string(),
            offset: 500,
            conflict_target: vec!["game_pk".to_string(), "pitch_number".to_string()],
            source: Box::new(LoadError::DatabaseError {
                code: "22003".to_string(),
                message: "smallint out of range".to_string(),
                detail: None,
                hint: None,
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 500"));
        assert!(msg.contains("game_pk"));
        assert!(msg.contains("smallint out of range"));
    }
}
