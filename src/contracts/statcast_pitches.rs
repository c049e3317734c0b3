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

//! # `staging.statcast_pitches`
//!
//! One row per pitch. Besides per-column bounds, two cross-column rules
//! catch physically impossible tracking output: strike zones whose top sits
//! below their bottom (or that are implausibly placed or sized), and an
//! effective velocity that drifts too far from the release velocity.

use crate::contracts::outcomes::{
    derive_is_ball, derive_is_bip, derive_is_called_strike, derive_is_foul, derive_is_swing,
    derive_is_whiff, derive_pitch_result_type,
};
use crate::contracts::statcast_common::common_pitch_columns;
use crate::domain::contract::{
    merge_columns, ColumnContract, ColumnKind, RuleOutcome, TableContract,
};
use crate::domain::errors::Result;
use crate::engine::batch::{float_column, null_cells};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;

/// Largest plausible gap between effective and release speed, in mph.
const MAX_EFFECTIVE_SPEED_DELTA: f64 = 6.0;

fn pitch_only_columns() -> Vec<ColumnContract> {
    use ColumnKind::*;
    vec![
        ColumnContract::new("pitch_number", Int16).primary_key().bounds(1.0, 130.0),
        ColumnContract::new("pitch_type", Text),
        ColumnContract::new("pitch_name", Text),
        ColumnContract::new("description", Text),
        ColumnContract::new("release_speed", Float64).bounds(20.0, 108.0),
        ColumnContract::new("release_pos_x", Float64).bounds(-6.0, 6.0),
        ColumnContract::new("release_pos_y", Float64).bounds(46.0, 60.0),
        ColumnContract::new("release_pos_z", Float64).bounds(2.5, 9.0),
        ColumnContract::new("release_spin_rate", Float64).bounds(500.0, 3500.0),
        ColumnContract::new("release_extension", Float64).bounds(3.5, 9.0),
        ColumnContract::new("spin_axis", Float64).bounds(0.0, 360.0),
        ColumnContract::new("effective_speed", Float64).bounds(60.0, 110.0),
        ColumnContract::new("pfx_x", Float64).bounds(-5.0, 5.0),
        ColumnContract::new("pfx_z", Float64).bounds(-4.5, 4.5),
        ColumnContract::new("vy0", Float64).bounds(-180.0, -50.0),
        ColumnContract::new("vx0", Float64).bounds(-30.0, 30.0),
        ColumnContract::new("vz0", Float64).bounds(-30.0, 30.0),
        ColumnContract::new("ax", Float64).bounds(-50.0, 50.0),
        ColumnContract::new("ay", Float64).bounds(0.0, 50.0),
        ColumnContract::new("az", Float64).bounds(-60.0, 20.0),
        ColumnContract::new("zone", Int16).bounds(1.0, 14.0),
        ColumnContract::new("plate_x", Float64).bounds(-3.0, 3.0),
        ColumnContract::new("plate_z", Float64).bounds(0.0, 7.0),
        ColumnContract::new("sz_top", Float64),
        ColumnContract::new("sz_bot", Float64),
        ColumnContract::new("p_throws", Text),
        ColumnContract::new("stand", Text),
        ColumnContract::new("balls", Int16).bounds(0.0, 3.0),
        ColumnContract::new("strikes", Int16).bounds(0.0, 2.0),
        ColumnContract::new("inning", Int16),
        ColumnContract::new("on_3b", Int64),
        ColumnContract::new("on_2b", Int64),
        ColumnContract::new("on_1b", Int64),
        ColumnContract::new("outs_when_up", Int16).bounds(0.0, 2.0),
        ColumnContract::new("home_score", Int16),
        ColumnContract::new("away_score", Int16),
        ColumnContract::new("bat_score", Int16),
        ColumnContract::new("fld_score", Int16),
        ColumnContract::new("home_score_diff", Int16),
        ColumnContract::new("bat_score_diff", Int16),
        ColumnContract::new("if_fielding_alignment", Text),
        ColumnContract::new("of_fielding_alignment", Text),
        ColumnContract::new("arm_angle", Float64).bounds(-30.0, 90.0),
        ColumnContract::new("home_team", Text),
        ColumnContract::new("away_team", Text),
        ColumnContract::new("game_type", Text),
        ColumnContract::new("pitch_result_type", Text).derived(derive_pitch_result_type),
        ColumnContract::new("is_bip", Boolean).derived(derive_is_bip),
        ColumnContract::new("is_whiff", Boolean).derived(derive_is_whiff),
        ColumnContract::new("is_called_strike", Boolean).derived(derive_is_called_strike),
        ColumnContract::new("is_ball", Boolean).derived(derive_is_ball),
        ColumnContract::new("is_swing", Boolean).derived(derive_is_swing),
        ColumnContract::new("is_foul", Boolean).derived(derive_is_foul),
    ]
}

/// Strike-zone sanity. All three masks are computed from the zone as it
/// arrived, so a row can count against more than one label.
pub fn rule_strike_zone(batch: RecordBatch) -> Result<RuleOutcome> {
    let (top, bot) = match (float_column(&batch, "sz_top"), float_column(&batch, "sz_bot")) {
        (Some(top), Some(bot)) => (top, bot),
        _ => {
            return Ok(RuleOutcome {
                batch,
                violations: BTreeMap::new(),
            })
        }
    };

    let mut inverted = Vec::with_capacity(top.len());
    let mut absolute = Vec::with_capacity(top.len());
    let mut height = Vec::with_capacity(top.len());
    for (t, b) in top.iter().zip(bot.iter()) {
        inverted.push(matches!((t, b), (Some(t), Some(b)) if b > t));
        absolute.push(
            matches!(t, Some(t) if *t < 2.0 || *t > 5.5)
                || matches!(b, Some(b) if *b < 0.5 || *b > 3.5),
        );
        height.push(matches!((t, b), (Some(t), Some(b)) if t - b < 0.5 || t - b > 5.0));
    }

    let zone = ["sz_top", "sz_bot"];
    let mut batch = batch;
    let mut violations = BTreeMap::new();
    for (label, mask) in [
        ("sz_inverted", &inverted),
        ("sz_abs_outliers", &absolute),
        ("sz_height_outliers", &height),
    ] {
        violations.insert(label.to_string(), mask.iter().filter(|m| **m).count());
        batch = null_cells(&batch, &zone, mask)?;
    }
    Ok(RuleOutcome { batch, violations })
}

/// Nulls `effective_speed` where it differs from `release_speed` by more
/// than the tolerance.
pub fn rule_effective_speed_delta(batch: RecordBatch) -> Result<RuleOutcome> {
    let (effective, release) = match (
        float_column(&batch, "effective_speed"),
        float_column(&batch, "release_speed"),
    ) {
        (Some(e), Some(r)) => (e, r),
        _ => {
            return Ok(RuleOutcome {
                batch,
                violations: BTreeMap::new(),
            })
        }
    };

    let mask: Vec<bool> = effective
        .iter()
        .zip(release.iter())
        .map(|(e, r)| matches!((e, r), (Some(e), Some(r)) if (e - r).abs() > MAX_EFFECTIVE_SPEED_DELTA))
        .collect();
    let count = mask.iter().filter(|m| **m).count();

    Ok(RuleOutcome {
        batch: null_cells(&batch, &["effective_speed"], &mask)?,
        violations: BTreeMap::from([("effective_speed_invalid".to_string(), count)]),
    })
}

pub fn contract() -> Result<TableContract> {
    Ok(TableContract::new(
        "statcast_pitches",
        &["game_pk", "game_counter", "pitch_number"],
        merge_columns(&[common_pitch_columns(), pitch_only_columns()]),
    )?
    .with_rules(vec![rule_strike_zone, rule_effective_speed_delta]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::enforcement::apply;
    use crate::engine::batch::{text_values, with_column};
    use arrow::array::{Array, ArrayRef, DictionaryArray, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::Int32Type;
    use std::sync::Arc;

    fn pitch_batch(sz_top: Vec<f64>, sz_bot: Vec<f64>) -> RecordBatch {
        let n = sz_top.len();
        RecordBatch::try_from_iter(vec![
            ("game_pk", Arc::new(Int64Array::from(vec![1; n])) as ArrayRef),
            ("at_bat_number", Arc::new(Int64Array::from(vec![1; n])) as ArrayRef),
            (
                "pitch_number",
                Arc::new(Int64Array::from((1..=n as i64).collect::<Vec<_>>())) as ArrayRef,
            ),
            ("pitcher", Arc::new(Int64Array::from(vec![543_037; n])) as ArrayRef),
            ("batter", Arc::new(Int64Array::from(vec![660_271; n])) as ArrayRef),
            (
                "description",
                Arc::new(StringArray::from(vec!["called_strike"; n])) as ArrayRef,
            ),
            ("sz_top", Arc::new(Float64Array::from(sz_top)) as ArrayRef),
            ("sz_bot", Arc::new(Float64Array::from(sz_bot)) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_inverted_zone_is_nulled_and_counted() {
        let batch = pitch_batch(vec![3.8, 3.4], vec![4.2, 1.6]);
        let (out, report) = apply(batch, &contract().unwrap()).unwrap();

        assert_eq!(report.rule_violations["sz_inverted"], 1);
        assert!(out.column_by_name("sz_top").unwrap().is_null(0));
        assert!(out.column_by_name("sz_bot").unwrap().is_null(0));
        assert!(!out.column_by_name("sz_top").unwrap().is_null(1));
        assert_eq!(report.rule_violations["sz_height_outliers"], 1);
    }

    #[test]
    fn test_effective_speed_drift() {
        let batch = RecordBatch::try_from_iter(vec![
            ("effective_speed", Arc::new(Float64Array::from(vec![Some(94.0), Some(84.0), None])) as ArrayRef),
            ("release_speed", Arc::new(Float64Array::from(vec![95.0, 95.0, 95.0])) as ArrayRef),
        ])
        .unwrap();
        let outcome = rule_effective_speed_delta(batch).unwrap();
        assert_eq!(outcome.violations["effective_speed_invalid"], 1);
        let eff = outcome.batch.column_by_name("effective_speed").unwrap();
        assert!(!eff.is_null(0));
        assert!(eff.is_null(1));
    }

    #[test]
    fn test_rules_skip_without_inputs() {
        let batch = RecordBatch::try_from_iter(vec![(
            "sz_top",
            Arc::new(Float64Array::from(vec![3.0])) as ArrayRef,
        )])
        .unwrap();
        let outcome = rule_strike_zone(batch).unwrap();
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_dictionary_encoded_text_survives_enforcement() {
        let description: DictionaryArray<Int32Type> =
            vec!["hit_into_play", "ball"].into_iter().collect();
        let game_type: DictionaryArray<Int32Type> = vec!["R", "R"].into_iter().collect();
        let batch = with_column(
            &pitch_batch(vec![3.4, 3.5], vec![1.6, 1.5]),
            "description",
            Arc::new(description),
        )
        .unwrap();
        let batch = with_column(&batch, "game_type", Arc::new(game_type)).unwrap();

        let (out, report) = apply(batch, &contract().unwrap()).unwrap();
        let text = |name: &str| text_values(out.column_by_name(name).unwrap().as_ref());
        assert_eq!(
            text("description"),
            vec![Some("hit_into_play".to_string()), Some("ball".to_string())]
        );
        assert_eq!(text("game_type"), vec![Some("R".to_string()), Some("R".to_string())]);
        assert_eq!(
            text("pitch_result_type"),
            vec![Some("in_play".to_string()), Some("ball".to_string())]
        );
        assert_eq!(text("is_bip"), vec![Some("true".to_string()), Some("false".to_string())]);
        assert_eq!(
            report.derived_columns["is_bip"],
            crate::domain::report::DerivationStatus::Derived
        );
    }

    #[test]
    fn test_pitch_flags_are_derived() {
        let batch = pitch_batch(vec![3.4], vec![1.6]);
        let (_, report) = apply(batch, &contract().unwrap()).unwrap();
        assert_eq!(report.derived_columns.len(), 7);
        assert!(report
            .derived_columns
            .values()
            .all(|s| *s == crate::domain::report::DerivationStatus::Derived));
        assert_eq!(report.duplicates_dropped, 0);
    }
}
