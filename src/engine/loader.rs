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

//! # Conflict-Aware Loader
//!
//! Splits an aligned batch into chunks and hands each one to the warehouse
//! as a single upsert. Rows with partial keys are rejected before anything
//! is sent. The first failing chunk aborts the call; chunks already
//! committed stay committed.

use crate::domain::entities::{DestinationColumn, LoadTarget};
use crate::domain::errors::{LoadError, Result};
use crate::engine::batch::{column_names, format_key, key_values};
use crate::ports::warehouse_port::WarehousePort;
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use log::{debug, error, info};

const NULL_KEY_SAMPLE_SIZE: usize = 25;

/// Upserts `batch` into `target`, returning the number of rows written.
///
/// `columns` is the destination's live column list; `batch` must already be
/// aligned to it.
pub fn upsert(
    port: &dyn WarehousePort,
    batch: &RecordBatch,
    target: &LoadTarget,
    columns: &[DestinationColumn],
    batch_size: usize,
) -> Result<u64> {
    check_primary_key(batch, target)?;

    let rows = batch.num_rows();
    if rows == 0 || batch.num_columns() == 0 {
        debug!("[{}] Nothing to load", target.qualified_name());
        return Ok(0);
    }

    let chunk_rows = chunk_size(batch_size, batch.num_columns(), port.max_bind_parameters());
    let mut written = 0u64;

    for offset in (0..rows).step_by(chunk_rows) {
        let len = chunk_rows.min(rows - offset);
        let chunk = batch.slice(offset, len);
        let (chunk, chunk_columns) = omit_defaulted(chunk, target, columns)?;

        let affected = port
            .upsert_chunk(target, &chunk_columns, &chunk)
            .map_err(|e| {
                error!(
                    "[{}] Upsert failed at row offset {} (ON CONFLICT {} on {:?}): {}",
                    target.qualified_name(),
                    offset,
                    target.constraint,
                    target.primary_key,
                    e
                );
                if let LoadError::DatabaseError { detail, hint, .. } = &e {
                    if let Some(detail) = detail {
                        error!("  detail: {}", detail);
                    }
                    if let Some(hint) = hint {
                        error!("  hint: {}", hint);
                    }
                }
                LoadError::BatchFailed {
                    table: target.qualified_name(),
                    offset,
                    conflict_target: target.primary_key.clone(),
                    source: Box::new(e),
                }
            })?;
        written += affected;
        debug!(
            "[{}] Chunk at offset {} wrote {} rows",
            target.qualified_name(),
            offset,
            affected
        );
    }

    info!(
        "[{}] Upserted {} rows in chunks of {}",
        target.qualified_name(),
        written,
        chunk_rows
    );
    Ok(written)
}

/// Rows per statement: the configured size, capped by the parameter limit.
fn chunk_size(batch_size: usize, num_columns: usize, max_params: Option<usize>) -> usize {
    let requested = batch_size.max(1);
    match max_params {
        Some(max) => requested.min((max / num_columns.max(1)).max(1)),
        None => requested,
    }
}

fn check_primary_key(batch: &RecordBatch, target: &LoadTarget) -> Result<()> {
    let available = column_names(batch);
    let missing: Vec<String> = target
        .primary_key
        .iter()
        .filter(|k| !available.contains(k))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingPrimaryKey {
            table: target.qualified_name(),
            missing,
            available,
        });
    }

    let views: Vec<_> = target
        .primary_key
        .iter()
        .filter_map(|k| batch.column_by_name(k))
        .map(|c| key_values(c.as_ref()))
        .collect();
    let bad_rows: Vec<usize> = (0..batch.num_rows())
        .filter(|&row| views.iter().any(|v| v[row].is_none()))
        .collect();

    if bad_rows.is_empty() {
        return Ok(());
    }
    let sample = bad_rows
        .iter()
        .take(NULL_KEY_SAMPLE_SIZE)
        .map(|&row| {
            let key: Vec<_> = views.iter().map(|v| v[row].clone()).collect();
            format_key(&key)
        })
        .collect();
    Err(LoadError::NullPrimaryKey {
        table: target.qualified_name(),
        primary_key: target.primary_key.clone(),
        count: bad_rows.len(),
        sample,
    })
}

/// Drops identity / server-default columns that are entirely null in `chunk`
/// so the database fills them in.
fn omit_defaulted(
    chunk: RecordBatch,
    target: &LoadTarget,
    columns: &[DestinationColumn],
) -> Result<(RecordBatch, Vec<DestinationColumn>)> {
    let keep: Vec<usize> = chunk
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(idx, field)| {
            !(target.defaulted_columns.contains(field.name())
                && chunk.column(*idx).null_count() == chunk.num_rows())
        })
        .map(|(idx, _)| idx)
        .collect();

    let projected = if keep.len() == chunk.num_columns() {
        chunk
    } else {
        chunk.project(&keep)?
    };

    let kept_columns = column_names(&projected)
        .iter()
        .map(|name| {
            columns
                .iter()
                .find(|c| &c.name == name)
                .cloned()
                .unwrap_or_else(|| DestinationColumn::new(name, "text"))
        })
        .collect();
    Ok((projected, kept_columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockWarehouse {
        calls: AtomicUsize,
        chunk_shapes: Mutex<Vec<(usize, Vec<String>)>>,
        fail_on_call: Option<usize>,
        max_params: Option<usize>,
    }

    impl WarehousePort for MockWarehouse {
        fn table_columns(&self, _: &str, _: &str) -> Result<Vec<DestinationColumn>> {
            Ok(vec![])
        }

        fn upsert_chunk(
            &self,
            _target: &LoadTarget,
            columns: &[DestinationColumn],
            chunk: &RecordBatch,
        ) -> Result<u64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(call) {
                return Err(LoadError::DatabaseError {
                    code: "23502".to_string(),
                    message: "null value in column".to_string(),
                    detail: Some("Failing row contains (...)".to_string()),
                    hint: None,
                });
            }
            self.chunk_shapes.lock().unwrap().push((
                chunk.num_rows(),
                columns.iter().map(|c| c.name.clone()).collect(),
            ));
            Ok(chunk.num_rows() as u64)
        }

        fn execute_script(&self, _: &str) -> Result<u64> {
            Ok(0)
        }

        fn max_bind_parameters(&self) -> Option<usize> {
            self.max_params
        }
    }

    fn target() -> LoadTarget {
        LoadTarget {
            schema: "staging".to_string(),
            table: "pitching_boxscores".to_string(),
            constraint: "pitching_boxscores_pkey".to_string(),
            primary_key: vec!["game_pk".to_string(), "pitcher_id".to_string()],
            defaulted_columns: vec!["ingested_at".to_string()],
        }
    }

    fn columns() -> Vec<DestinationColumn> {
        vec![
            DestinationColumn::new("game_pk", "int8"),
            DestinationColumn::new("pitcher_id", "int8"),
            DestinationColumn::new("ingested_at", "timestamptz"),
        ]
    }

    fn batch(pitchers: Vec<Option<i64>>) -> RecordBatch {
        let n = pitchers.len();
        RecordBatch::try_from_iter(vec![
            ("game_pk", Arc::new(Int64Array::from(vec![7; n])) as ArrayRef),
            ("pitcher_id", Arc::new(Int64Array::from(pitchers)) as ArrayRef),
            (
                "ingested_at",
                Arc::new(StringArray::from(vec![None::<&str>; n])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_null_key_raises_before_any_sql() {
        let port = MockWarehouse::default();
        let err = upsert(&port, &batch(vec![Some(1), None]), &target(), &columns(), 500).unwrap_err();

        assert!(matches!(err, LoadError::NullPrimaryKey { count: 1, .. }));
        assert_eq!(port.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chunks_and_defaulted_columns() {
        let port = MockWarehouse::default();
        let rows = upsert(
            &port,
            &batch((1..=5).map(Some).collect()),
            &target(),
            &columns(),
            2,
        )
        .unwrap();

        assert_eq!(rows, 5);
        let shapes = port.chunk_shapes.lock().unwrap();
        let sizes: Vec<usize> = shapes.iter().map(|(n, _)| *n).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(shapes[0].1, vec!["game_pk", "pitcher_id"]);
    }

    #[test]
    fn test_parameter_cap_limits_chunk_rows() {
        let port = MockWarehouse {
            max_params: Some(6),
            ..Default::default()
        };
        upsert(&port, &batch((1..=5).map(Some).collect()), &target(), &columns(), 500).unwrap();
        assert_eq!(port.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failure_carries_offset_and_target() {
        let port = MockWarehouse {
            fail_on_call: Some(1),
            ..Default::default()
        };
        let err = upsert(&port, &batch((1..=5).map(Some).collect()), &target(), &columns(), 2).unwrap_err();

        match err {
            LoadError::BatchFailed {
                offset,
                conflict_target,
                source,
                ..
            } => {
                assert_eq!(offset, 2);
                assert_eq!(conflict_target, vec!["game_pk", "pitcher_id"]);
                assert!(matches!(*source, LoadError::DatabaseError { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(port.chunk_shapes.lock().unwrap().len(), 1);
    }
}
