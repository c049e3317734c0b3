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

//! # Primary-Key Deduplication
//!
//! Last write wins under a deterministic ordering: when duplicate keys exist
//! the batch is stably sorted by the tie-break columns that are present
//! (nulls last) and the final row of each key group survives.

use crate::domain::errors::{LoadError, Result};
use crate::engine::batch::{cmp_nulls_last, column_names, format_key, key_tuples, key_values, select_rows};
use arrow::record_batch::RecordBatch;
use log::warn;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Tie-break columns in priority order; absent ones are skipped.
pub const TIE_BREAK_COLUMNS: [&str; 6] = [
    "game_pk",
    "game_counter",
    "at_bat_number",
    "pitch_number",
    "game_date",
    "ingested_at",
];

pub const DUPLICATE_SAMPLE_SIZE: usize = 25;

#[derive(Debug)]
pub struct DedupeOutcome {
    pub batch: RecordBatch,
    /// Rows removed from the batch.
    pub dropped: usize,
    /// Key tuples of the first duplicated rows, e.g. `(100, 3, 5)`.
    pub sample: Vec<String>,
}

/// Resolves duplicate primary keys in `batch`.
///
/// Fails with `MissingPrimaryKey` if any key column is absent. A batch with
/// unique keys is returned untouched, in its original order.
pub fn dedupe(batch: &RecordBatch, table: &str, primary_key: &[String]) -> Result<DedupeOutcome> {
    let available = column_names(batch);
    let missing: Vec<String> = primary_key
        .iter()
        .filter(|k| !available.contains(k))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingPrimaryKey {
            table: table.to_string(),
            missing,
            available,
        });
    }

    let keys = key_tuples(batch, primary_key);
    let mut group_sizes: HashMap<&[_], usize> = HashMap::new();
    for key in &keys {
        *group_sizes.entry(key.as_slice()).or_insert(0) += 1;
    }
    if group_sizes.len() == keys.len() {
        return Ok(DedupeOutcome {
            batch: batch.clone(),
            dropped: 0,
            sample: Vec::new(),
        });
    }

    let sample: Vec<String> = keys
        .iter()
        .filter(|k| group_sizes[k.as_slice()] > 1)
        .take(DUPLICATE_SAMPLE_SIZE)
        .map(|k| format_key(k))
        .collect();

    let sort_views: Vec<_> = TIE_BREAK_COLUMNS
        .iter()
        .filter_map(|c| batch.column_by_name(c))
        .map(|c| key_values(c.as_ref()))
        .collect();

    let mut order: Vec<usize> = (0..batch.num_rows()).collect();
    order.sort_by(|&a, &b| {
        sort_views
            .iter()
            .map(|view| cmp_nulls_last(&view[a], &view[b]))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    let mut last_position: HashMap<&[_], usize> = HashMap::new();
    for (pos, &row) in order.iter().enumerate() {
        last_position.insert(keys[row].as_slice(), pos);
    }
    let kept: Vec<usize> = order
        .iter()
        .enumerate()
        .filter(|(pos, &row)| last_position[keys[row].as_slice()] == *pos)
        .map(|(_, &row)| row)
        .collect();

    let dropped = batch.num_rows() - kept.len();
    warn!(
        "[{}] Dropping {} duplicate rows based on key {:?}. Sample keys: {}",
        table,
        dropped,
        primary_key,
        sample.join(", ")
    );

    Ok(DedupeOutcome {
        batch: select_rows(batch, &kept)?,
        dropped,
        sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::batch::{cell, Cell};
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn pk() -> Vec<String> {
        vec!["game_pk".into(), "game_counter".into(), "pitch_number".into()]
    }

    fn pitches(ingested: Vec<&str>, order: Vec<usize>) -> RecordBatch {
        let n = order.len();
        let label: Vec<String> = order.iter().map(|i| format!("row{}", i)).collect();
        let ingested: Vec<&str> = order.iter().map(|&i| ingested[i]).collect();
        RecordBatch::try_from_iter(vec![
            ("game_pk", Arc::new(Int64Array::from(vec![100; n])) as ArrayRef),
            ("game_counter", Arc::new(Int64Array::from(vec![3; n])) as ArrayRef),
            ("pitch_number", Arc::new(Int64Array::from(vec![5; n])) as ArrayRef),
            ("ingested_at", Arc::new(StringArray::from(ingested)) as ArrayRef),
            ("label", Arc::new(StringArray::from(label)) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_later_ingestion_survives() {
        let stamps = vec!["2025-04-01T10:00:00Z", "2025-04-02T10:00:00Z"];
        let out = dedupe(&pitches(stamps, vec![0, 1]), "statcast_pitches", &pk()).unwrap();

        assert_eq!(out.batch.num_rows(), 1);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.sample[0], "(100, 3, 5)");
        let label = out.batch.column_by_name("label").unwrap();
        assert_eq!(cell(label.as_ref(), 0), Cell::Text("row1"));
    }

    #[test]
    fn test_survivor_independent_of_input_order() {
        let stamps = vec!["2025-04-01", "2025-04-03", "2025-04-02"];
        let forward = dedupe(&pitches(stamps.clone(), vec![0, 1, 2]), "t", &pk()).unwrap();
        let shuffled = dedupe(&pitches(stamps, vec![2, 1, 0]), "t", &pk()).unwrap();

        for out in [forward, shuffled] {
            let label = out.batch.column_by_name("label").unwrap();
            assert_eq!(cell(label.as_ref(), 0), Cell::Text("row1"));
        }
    }

    #[test]
    fn test_unique_batch_is_untouched() {
        let batch = RecordBatch::try_from_iter(vec![(
            "player_id",
            Arc::new(Int64Array::from(vec![3, 1, 2])) as ArrayRef,
        )])
        .unwrap();
        let out = dedupe(&batch, "dim_player", &["player_id".to_string()]).unwrap();
        assert_eq!(out.dropped, 0);
        assert_eq!(out.batch, batch);
    }

    #[test]
    fn test_missing_key_column_fails() {
        let batch = pitches(vec!["x"], vec![0]);
        let err = dedupe(&batch, "t", &["pitcher".to_string()]).unwrap_err();
        assert!(matches!(err, LoadError::MissingPrimaryKey { .. }));
    }
}
