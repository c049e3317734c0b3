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

//! # In-Memory Warehouse
//!
//! A `WarehousePort` that keeps tables as rows of text cells. It applies the
//! same conflict rule as the PostgreSQL upsert (stored non-null values win,
//! stored nulls are filled) and applies each chunk atomically, which makes
//! it the backend for dry runs and for tests of the load path.
//!
//! SQL scripts are recorded, not interpreted.

use crate::domain::entities::{DestinationColumn, LoadTarget};
use crate::domain::errors::{LoadError, Result};
use crate::engine::batch::cell_text;
use crate::ports::warehouse_port::WarehousePort;
use arrow::record_batch::RecordBatch;
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<DestinationColumn>,
    rows: Vec<Vec<Option<String>>>,
    /// Primary-key cells to row position.
    index: HashMap<Vec<String>, usize>,
}

impl MemoryTable {
    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column)
    }
}

#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: Mutex<HashMap<String, MemoryTable>>,
    scripts: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn db_error(code: &str, message: String) -> LoadError {
    LoadError::DatabaseError {
        code: code.to_string(),
        message,
        detail: None,
        hint: None,
    }
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) an empty table.
    pub fn register_table(&self, schema: &str, table: &str, columns: Vec<DestinationColumn>) {
        let table_data = MemoryTable {
            columns,
            ..MemoryTable::default()
        };
        lock(&self.tables).insert(format!("{}.{}", schema, table), table_data);
    }

    pub fn row_count(&self, schema: &str, table: &str) -> usize {
        lock(&self.tables)
            .get(&format!("{}.{}", schema, table))
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    /// Reads one stored cell, looking the row up by its key cells.
    pub fn value(&self, schema: &str, table: &str, key: &[&str], column: &str) -> Option<String> {
        let tables = lock(&self.tables);
        let data = tables.get(&format!("{}.{}", schema, table))?;
        let key: Vec<String> = key.iter().map(|k| k.to_string()).collect();
        let row = *data.index.get(&key)?;
        let col = data.position(column)?;
        data.rows[row][col].clone()
    }

    /// Scripts passed to `execute_script`, in order.
    pub fn executed_scripts(&self) -> Vec<String> {
        lock(&self.scripts).clone()
    }
}

impl WarehousePort for MemoryWarehouse {
    fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<DestinationColumn>> {
        Ok(lock(&self.tables)
            .get(&format!("{}.{}", schema, table))
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    fn upsert_chunk(
        &self,
        target: &LoadTarget,
        columns: &[DestinationColumn],
        chunk: &RecordBatch,
    ) -> Result<u64> {
        let name = target.qualified_name();
        let mut tables = lock(&self.tables);
        let stored = tables
            .get(&name)
            .ok_or_else(|| db_error("42P01", format!("relation {} does not exist", name)))?;

        // Work on a copy so a failing row leaves the table untouched.
        let mut staged = stored.clone();

        let positions = columns
            .iter()
            .map(|c| {
                staged.position(&c.name).ok_or_else(|| {
                    db_error("42703", format!("column \"{}\" of relation {} does not exist", c.name, name))
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        let key_positions = target
            .primary_key
            .iter()
            .map(|k| {
                columns
                    .iter()
                    .position(|c| &c.name == k)
                    .ok_or_else(|| db_error("42P10", format!("key column \"{}\" missing from insert", k)))
            })
            .collect::<Result<Vec<usize>>>()?;

        let arrays = columns
            .iter()
            .map(|c| chunk.column_by_name(&c.name).cloned())
            .collect::<Vec<_>>();

        for row in 0..chunk.num_rows() {
            let incoming: Vec<Option<String>> = arrays
                .iter()
                .map(|a| a.as_ref().and_then(|a| cell_text(a.as_ref(), row)))
                .collect();

            let key = key_positions
                .iter()
                .map(|&i| {
                    incoming[i].clone().ok_or_else(|| {
                        db_error(
                            "23502",
                            format!("null value in key column \"{}\" of {}", columns[i].name, name),
                        )
                    })
                })
                .collect::<Result<Vec<String>>>()?;

            match staged.index.get(&key).copied() {
                Some(existing) => {
                    let stored_row = &mut staged.rows[existing];
                    for (value, &pos) in incoming.into_iter().zip(positions.iter()) {
                        if stored_row[pos].is_none() {
                            stored_row[pos] = value;
                        }
                    }
                }
                None => {
                    let mut new_row = vec![None; staged.columns.len()];
                    for (value, &pos) in incoming.into_iter().zip(positions.iter()) {
                        new_row[pos] = value;
                    }
                    staged.index.insert(key, staged.rows.len());
                    staged.rows.push(new_row);
                }
            }
        }

        debug!("[{}] Upserted {} rows in memory", name, chunk.num_rows());
        tables.insert(name, staged);
        Ok(chunk.num_rows() as u64)
    }

    fn execute_script(&self, script: &str) -> Result<u64> {
        lock(&self.scripts).push(script.to_string());
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array};
    use std::sync::Arc;

    fn target() -> LoadTarget {
        LoadTarget {
            schema: "staging".to_string(),
            table: "t".to_string(),
            constraint: "t_pkey".to_string(),
            primary_key: vec!["id".to_string()],
            defaulted_columns: vec![],
        }
    }

    fn columns() -> Vec<DestinationColumn> {
        vec![DestinationColumn::new("id", "int8"), DestinationColumn::new("x", "int8")]
    }

    fn warehouse() -> MemoryWarehouse {
        let wh = MemoryWarehouse::new();
        wh.register_table("staging", "t", columns());
        wh
    }

    fn chunk(ids: Vec<Option<i64>>, xs: Vec<Option<i64>>) -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            ("id", Arc::new(Int64Array::from(ids)) as ArrayRef),
            ("x", Arc::new(Int64Array::from(xs)) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_reloading_the_same_rows_is_idempotent() {
        let wh = warehouse();
        let batch = chunk(vec![Some(1), Some(2)], vec![Some(10), None]);
        wh.upsert_chunk(&target(), &columns(), &batch).unwrap();
        wh.upsert_chunk(&target(), &columns(), &batch).unwrap();
        assert_eq!(wh.row_count("staging", "t"), 2);
        assert_eq!(wh.value("staging", "t", &["1"], "x").as_deref(), Some("10"));
        assert_eq!(wh.value("staging", "t", &["2"], "x"), None);
    }

    #[test]
    fn test_stored_values_win_and_nulls_are_filled() {
        let wh = warehouse();
        wh.upsert_chunk(&target(), &columns(), &chunk(vec![Some(1), Some(2)], vec![Some(5), None]))
            .unwrap();
        wh.upsert_chunk(&target(), &columns(), &chunk(vec![Some(1), Some(2)], vec![None, Some(7)]))
            .unwrap();
        assert_eq!(wh.value("staging", "t", &["1"], "x").as_deref(), Some("5"));
        assert_eq!(wh.value("staging", "t", &["2"], "x").as_deref(), Some("7"));
    }

    #[test]
    fn test_failing_chunk_leaves_table_untouched() {
        let wh = warehouse();
        let err = wh
            .upsert_chunk(&target(), &columns(), &chunk(vec![Some(1), None], vec![Some(5), Some(6)]))
            .unwrap_err();
        assert!(matches!(err, LoadError::DatabaseError { ref code, .. } if code == "23502"));
        assert_eq!(wh.row_count("staging", "t"), 0);
    }

    #[test]
    fn test_unknown_table_has_no_columns() {
        let wh = MemoryWarehouse::new();
        assert!(wh.table_columns("staging", "missing").unwrap().is_empty());
    }
}
