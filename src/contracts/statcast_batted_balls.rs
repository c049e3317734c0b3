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

//! # `staging.statcast_batted_balls`
//!
//! The pitch feed narrowed to balls put in play, with contact quality
//! columns bounded to what tracking can physically report.

use crate::contracts::outcomes::{derive_is_homerun, is_bip};
use crate::contracts::statcast_common::common_pitch_columns;
use crate::domain::contract::{merge_columns, ColumnContract, ColumnKind, TableContract};
use crate::domain::errors::Result;
use crate::engine::batch::text_values;
use arrow::array::BooleanArray;
use arrow::record_batch::RecordBatch;

fn batted_ball_only_columns() -> Vec<ColumnContract> {
    use ColumnKind::*;
    vec![
        ColumnContract::new("pitch_number", Int16).primary_key().bounds(1.0, 130.0),
        ColumnContract::new("pitch_type", Text),
        ColumnContract::new("bb_type", Text),
        ColumnContract::new("launch_speed", Float64).bounds(30.0, 135.0),
        ColumnContract::new("launch_angle", Float64).bounds(-90.0, 100.0),
        ColumnContract::new("hit_distance_sc", Float64).bounds(0.0, 550.0),
        ColumnContract::new("estimated_ba_using_speedangle", Float64).bounds(0.0, 1.0),
        ColumnContract::new("estimated_woba_using_speedangle", Float64).bounds(0.0, 2.2),
        ColumnContract::new("estimated_slg_using_speedangle", Float64).bounds(0.0, 4.0),
        ColumnContract::new("babip_value", Int16).bounds(0.0, 1.0),
        ColumnContract::new("iso_value", Int16).bounds(0.0, 3.0),
        ColumnContract::new("woba_value", Float64).bounds(0.0, 2.5),
        ColumnContract::new("hit_location", Int16).bounds(1.0, 9.0),
        ColumnContract::new("hc_x", Float64).bounds(0.0, 275.0),
        ColumnContract::new("hc_y", Float64).bounds(0.0, 275.0),
        ColumnContract::new("description", Text),
        ColumnContract::new("events", Text),
        ColumnContract::new("is_homerun", Boolean).derived(derive_is_homerun),
    ]
}

/// Keeps only balls in play. Without a `description` column nothing is.
pub fn filter_in_play(batch: &RecordBatch) -> Result<BooleanArray> {
    let keep = match batch.column_by_name("description") {
        Some(description) => text_values(description.as_ref())
            .into_iter()
            .map(|d| Some(d.as_deref().map(is_bip).unwrap_or(false)))
            .collect::<BooleanArray>(),
        None => BooleanArray::from(vec![false; batch.num_rows()]),
    };
    Ok(keep)
}

pub fn contract() -> Result<TableContract> {
    Ok(TableContract::new(
        "statcast_batted_balls",
        &["game_pk", "game_counter", "pitch_number"],
        merge_columns(&[common_pitch_columns(), batted_ball_only_columns()]),
    )?
    .with_filters(vec![filter_in_play]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::enforcement::apply;
    use arrow::array::{ArrayRef, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_only_balls_in_play_survive() {
        let batch = RecordBatch::try_from_iter(vec![
            ("game_pk", Arc::new(StringArray::from(vec!["776543"; 3])) as ArrayRef),
            ("at_bat_number", Arc::new(StringArray::from(vec!["4", "4", "5"])) as ArrayRef),
            ("pitch_number", Arc::new(StringArray::from(vec!["1", "2", "1"])) as ArrayRef),
            (
                "description",
                Arc::new(StringArray::from(vec![Some("foul"), Some("hit_into_play"), None])) as ArrayRef,
            ),
            (
                "events",
                Arc::new(StringArray::from(vec![None, Some("home_run"), None])) as ArrayRef,
            ),
            ("launch_speed", Arc::new(StringArray::from(vec!["88.1", "141.0", ""])) as ArrayRef),
        ])
        .unwrap();

        let (out, report) = apply(batch, &contract().unwrap()).unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(report.rows_in, 3);
        assert_eq!(report.rows_out, 1);
        // Bounds are counted before the filter narrows the batch.
        assert_eq!(report.invalid_bounds["launch_speed"], 1);
        assert_eq!(
            crate::engine::batch::bool_values(out.column_by_name("is_homerun").unwrap().as_ref()),
            vec![Some(true)]
        );
    }
}
