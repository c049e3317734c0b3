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

//! # `staging.statcast_at_bats`
//!
//! Two contracts: `statcast_at_bats_input` cleans the pitch-level rows the
//! at-bat builder aggregates, and `statcast_at_bats` validates the
//! aggregated plate appearances it produces.

use crate::contracts::outcomes::{
    derive_is_called_strike, derive_is_foul, derive_is_swing, derive_is_whiff,
};
use crate::contracts::statcast_common::common_pitch_columns;
use crate::domain::contract::{merge_columns, ColumnContract, ColumnKind, TableContract};
use crate::domain::errors::Result;

/// Pitch-level flags summed per plate appearance, and their total columns.
pub const PITCH_FLAG_TOTALS: [(&str, &str); 4] = [
    ("is_whiff", "total_whiffs"),
    ("is_called_strike", "total_called_strikes"),
    ("is_swing", "total_swings"),
    ("is_foul", "total_fouls"),
];

fn at_bat_only_columns() -> Vec<ColumnContract> {
    use ColumnKind::*;
    vec![
        ColumnContract::new("inning", Int16).bounds(1.0, 30.0),
        ColumnContract::new("inning_topbot", Text),
        ColumnContract::new("last_pitch_number", Int16),
        ColumnContract::new("events", Text),
        ColumnContract::new("balls", Int16).bounds(0.0, 3.0),
        ColumnContract::new("strikes", Int16).bounds(0.0, 2.0),
        ColumnContract::new("outs_when_up", Int16).bounds(0.0, 2.0),
        ColumnContract::new("times_through_order", Int16)
            .bounds(1.0, 10.0)
            .renamed_from("n_thruorder_pitcher"),
        ColumnContract::new("bat_score", Int16).bounds(0.0, 30.0),
        ColumnContract::new("fld_score", Int16).bounds(0.0, 30.0),
        ColumnContract::new("bat_score_diff", Int16).bounds(-30.0, 30.0),
        ColumnContract::new("post_bat_score", Int16).bounds(0.0, 30.0),
    ]
}

/// Columns the builder needs on every pitch before it aggregates.
fn aggregation_input_columns() -> Vec<ColumnContract> {
    use ColumnKind::*;
    vec![
        ColumnContract::new("pitch_number", Int64).bounds(1.0, 135.0),
        ColumnContract::new("bat_score", Int16).bounds(0.0, 30.0),
        ColumnContract::new("fld_score", Int16).bounds(0.0, 30.0),
        ColumnContract::new("on_1b", Int64),
        ColumnContract::new("on_2b", Int64),
        ColumnContract::new("on_3b", Int64),
        ColumnContract::new("stand", Text),
        ColumnContract::new("p_throws", Text),
        ColumnContract::new("description", Text),
        ColumnContract::new("post_bat_score", Int16).bounds(0.0, 30.0),
        ColumnContract::new("is_whiff", Boolean).derived(derive_is_whiff),
        ColumnContract::new("is_called_strike", Boolean).derived(derive_is_called_strike),
        ColumnContract::new("is_swing", Boolean).derived(derive_is_swing),
        ColumnContract::new("is_foul", Boolean).derived(derive_is_foul),
        ColumnContract::new("bat_score_diff", Int16).bounds(-30.0, 30.0),
    ]
}

/// Columns the builder computes for each plate appearance.
fn aggregated_columns() -> Vec<ColumnContract> {
    use ColumnKind::*;
    vec![
        ColumnContract::new("outs_on_ab", Int16).bounds(0.0, 3.0),
        ColumnContract::new("is_bip", Boolean),
        ColumnContract::new("is_walk", Boolean),
        ColumnContract::new("is_strikeout", Boolean),
        ColumnContract::new("rbi", Int16).bounds(0.0, 4.0),
        ColumnContract::new("total_whiffs", Int16).bounds(0.0, 30.0),
        ColumnContract::new("total_pitches", Int16).bounds(1.0, 30.0),
        ColumnContract::new("total_called_strikes", Int16).bounds(0.0, 30.0),
        ColumnContract::new("total_swings", Int16).bounds(0.0, 30.0),
        ColumnContract::new("total_fouls", Int16).bounds(0.0, 30.0),
        ColumnContract::new("pitcher_pa_number", Int16).bounds(1.0, 100.0),
    ]
}

pub fn input_contract() -> Result<TableContract> {
    TableContract::new(
        "statcast_at_bats_input",
        &["game_pk", "game_counter", "pitch_number"],
        merge_columns(&[
            common_pitch_columns(),
            at_bat_only_columns(),
            aggregation_input_columns(),
        ]),
    )
}

pub fn contract() -> Result<TableContract> {
    TableContract::new(
        "statcast_at_bats",
        &["game_pk", "game_counter"],
        merge_columns(&[
            common_pitch_columns(),
            at_bat_only_columns(),
            aggregated_columns(),
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_contract_keys_on_pitch() {
        let input = input_contract().unwrap();
        assert_eq!(input.primary_key, vec!["game_pk", "game_counter", "pitch_number"]);
        assert_eq!(input.column("pitch_number").unwrap().kind, ColumnKind::Int64);
        assert!(input.column("is_swing").unwrap().derive.is_some());
    }

    #[test]
    fn test_output_contract_has_aggregates_not_pitch_fields() {
        let output = contract().unwrap();
        assert!(output.column("total_pitches").is_some());
        assert!(output.column("pitch_number").is_none());
        assert_eq!(
            output.column("times_through_order").unwrap().original_name.as_deref(),
            Some("n_thruorder_pitcher")
        );
    }
}
