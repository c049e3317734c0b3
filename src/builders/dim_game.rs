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

//! Game dimension rows, taken from the first pitch seen for each game.

use crate::domain::errors::{LoadError, Result};
use crate::engine::batch::{key_values, select_rows};
use arrow::record_batch::RecordBatch;
use log::debug;
use std::collections::HashSet;

const GAME_COLUMNS: [&str; 5] = ["game_pk", "game_date", "game_type", "home_team", "away_team"];

pub fn build_dim_game(batch: RecordBatch) -> Result<RecordBatch> {
    let games = batch
        .column_by_name("game_pk")
        .map(|c| key_values(c.as_ref()))
        .ok_or_else(|| LoadError::BuilderError {
            table: "dim_game".to_string(),
            reason: "source batch has no game_pk column".to_string(),
        })?;

    let mut seen = HashSet::new();
    let first_rows: Vec<usize> = games
        .into_iter()
        .enumerate()
        .filter_map(|(row, game)| game.filter(|g| seen.insert(g.clone())).map(|_| row))
        .collect();

    let schema = batch.schema();
    let keep: Vec<usize> = GAME_COLUMNS
        .iter()
        .filter_map(|c| schema.index_of(c).ok())
        .collect();
    let projected = batch.project(&keep)?;

    debug!(
        "[dim_game] {} games from {} source rows",
        first_rows.len(),
        batch.num_rows()
    );
    select_rows(&projected, &first_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_first_row_per_game_wins() {
        let batch = RecordBatch::try_from_iter(vec![
            ("game_pk", Arc::new(Int64Array::from(vec![Some(1), Some(2), Some(1), None])) as ArrayRef),
            (
                "game_date",
                Arc::new(StringArray::from(vec!["2024-04-01", "2024-04-02", "2024-05-01", "2024-04-03"])) as ArrayRef,
            ),
            ("pitch_type", Arc::new(StringArray::from(vec!["FF", "SL", "CH", "CU"])) as ArrayRef),
        ])
        .unwrap();

        let out = build_dim_game(batch).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert_eq!(out.num_columns(), 2);
        let dates = out
            .column_by_name("game_date")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(dates.value(0), "2024-04-01");
        assert_eq!(dates.value(1), "2024-04-02");
    }

    #[test]
    fn test_missing_game_pk_is_a_builder_error() {
        let batch = RecordBatch::try_from_iter(vec![(
            "game_date",
            Arc::new(StringArray::from(vec!["2024-04-01"])) as ArrayRef,
        )])
        .unwrap();
        assert!(matches!(build_dim_game(batch), Err(LoadError::BuilderError { .. })));
    }
}
