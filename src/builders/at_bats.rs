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

//! # At-Bat Builder
//!
//! Collapses pitch rows into plate appearances. The last pitch of each
//! `(game_pk, game_counter)` group is the representative row: it carries the
//! final count, the final score and the terminal event. Per-pitch flags are
//! summed onto it, and each plate appearance gets its ordinal among those
//! the same pitcher faced in that game.
//!
//! Pitch rows with a null `game_pk` or `game_counter` cannot be placed in a
//! plate appearance and are left out. The result still has to go through
//! the `statcast_at_bats` contract like any other batch.

use crate::contracts::outcomes::{is_bip, is_strikeout, is_walk, outs_on_event};
use crate::contracts::statcast_at_bats::{self, PITCH_FLAG_TOTALS};
use crate::domain::errors::{LoadError, Result};
use crate::engine::batch::{
    bool_values, cmp_nulls_last, has_column, key_values, numeric_values, select_rows,
    text_values, with_column, KeyValue,
};
use crate::engine::enforcement::apply;
use arrow::array::{ArrayRef, BooleanArray, Int64Array};
use arrow::record_batch::RecordBatch;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;

const REQUIRED_COLUMNS: [&str; 5] = [
    "game_pk",
    "game_counter",
    "pitch_number",
    "bat_score",
    "post_bat_score",
];

/// Enforces the pitch-level input contract, then aggregates to plate appearances.
pub fn build_at_bats(batch: RecordBatch) -> Result<RecordBatch> {
    let (pitches, _) = apply(batch, &statcast_at_bats::input_contract()?)?;

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !has_column(&pitches, c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::BuilderError {
            table: "statcast_at_bats".to_string(),
            reason: format!("missing required columns for at-bat build: {:?}", missing),
        });
    }

    let keys = |name: &str| -> Vec<Option<KeyValue>> {
        pitches
            .column_by_name(name)
            .map(|c| key_values(c.as_ref()))
            .unwrap_or_else(|| vec![None; pitches.num_rows()])
    };
    let game = keys("game_pk");
    let counter = keys("game_counter");
    let pitch = keys("pitch_number");
    let pitcher = keys("pitcher");

    let mut order: Vec<usize> = (0..pitches.num_rows()).collect();
    order.sort_by(|&a, &b| {
        cmp_nulls_last(&game[a], &game[b])
            .then_with(|| cmp_nulls_last(&counter[a], &counter[b]))
            .then_with(|| cmp_nulls_last(&pitch[a], &pitch[b]))
    });

    let mut groups: Vec<Vec<usize>> = Vec::new();
    for row in order {
        if game[row].is_none() || counter[row].is_none() {
            continue;
        }
        match groups.last_mut() {
            Some(group) if game[group[0]] == game[row] && counter[group[0]] == counter[row] => {
                group.push(row)
            }
            _ => groups.push(vec![row]),
        }
    }
    let last_rows: Vec<usize> = groups.iter().filter_map(|g| g.last().copied()).collect();

    let mut at_bats = select_rows(&pitches, &last_rows)?;

    for (flag, total) in PITCH_FLAG_TOTALS {
        if let Some(values) = pitches.column_by_name(flag).map(|c| bool_values(c.as_ref())) {
            let sums: Int64Array = groups
                .iter()
                .map(|g| Some(g.iter().filter(|&&r| values[r] == Some(true)).count() as i64))
                .collect();
            at_bats = with_column(&at_bats, total, Arc::new(sums))?;
        }
    }

    let total_pitches: Int64Array = groups.iter().map(|g| Some(g.len() as i64)).collect();
    at_bats = with_column(&at_bats, "total_pitches", Arc::new(total_pitches))?;

    let pa_numbers = pitcher_pa_numbers(&last_rows, &game, &counter, &pitcher);
    at_bats = with_column(&at_bats, "pitcher_pa_number", Arc::new(pa_numbers))?;

    if let Some(pitch_number) = at_bats.column_by_name("pitch_number").cloned() {
        at_bats = with_column(&at_bats, "last_pitch_number", pitch_number)?;
    }

    at_bats = with_column(&at_bats, "rbi", Arc::new(runs_batted_in(&at_bats)))?;

    let events = text_column(&at_bats, "events");
    let description = text_column(&at_bats, "description");
    let outs: Int64Array = events
        .iter()
        .map(|e| Some(outs_on_event(e.as_deref())))
        .collect();
    at_bats = with_column(&at_bats, "outs_on_ab", Arc::new(outs))?;
    at_bats = with_column(&at_bats, "is_bip", flags(&description, is_bip))?;
    at_bats = with_column(&at_bats, "is_strikeout", flags(&events, is_strikeout))?;
    at_bats = with_column(&at_bats, "is_walk", flags(&events, is_walk))?;

    info!(
        "[statcast_at_bats] Built {} plate appearances from {} pitches",
        at_bats.num_rows(),
        pitches.num_rows()
    );
    Ok(at_bats)
}

/// Ordinal of each plate appearance among those its pitcher faced in the game.
fn pitcher_pa_numbers(
    last_rows: &[usize],
    game: &[Option<KeyValue>],
    counter: &[Option<KeyValue>],
    pitcher: &[Option<KeyValue>],
) -> Int64Array {
    let mut by_pitcher: Vec<usize> = (0..last_rows.len()).collect();
    by_pitcher.sort_by(|&a, &b| {
        let (ra, rb) = (last_rows[a], last_rows[b]);
        cmp_nulls_last(&game[ra], &game[rb])
            .then_with(|| cmp_nulls_last(&pitcher[ra], &pitcher[rb]))
            .then_with(|| cmp_nulls_last(&counter[ra], &counter[rb]))
    });

    let mut seen: HashMap<(Option<KeyValue>, KeyValue), i64> = HashMap::new();
    let mut numbers: Vec<Option<i64>> = vec![None; last_rows.len()];
    for idx in by_pitcher {
        let row = last_rows[idx];
        if let Some(p) = &pitcher[row] {
            let n = seen.entry((game[row].clone(), p.clone())).or_insert(0);
            *n += 1;
            numbers[idx] = Some(*n);
        }
    }
    Int64Array::from(numbers)
}

/// `post_bat_score - bat_score`, clamped at zero; unknown scores give zero.
fn runs_batted_in(at_bats: &RecordBatch) -> Int64Array {
    let score = |name: &str| {
        at_bats
            .column_by_name(name)
            .map(|c| numeric_values(c.as_ref()))
            .unwrap_or_else(|| vec![None; at_bats.num_rows()])
    };
    let before = score("bat_score");
    let after = score("post_bat_score");
    before
        .iter()
        .zip(after.iter())
        .map(|(b, a)| match (b, a) {
            (Some(b), Some(a)) => Some((a - b).max(0.0) as i64),
            _ => Some(0),
        })
        .collect()
}

fn text_column(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    batch
        .column_by_name(name)
        .map(|c| text_values(c.as_ref()))
        .unwrap_or_else(|| vec![None; batch.num_rows()])
}

fn flags(values: &[Option<String>], predicate: fn(&str) -> bool) -> ArrayRef {
    Arc::new(
        values
            .iter()
            .map(|v| Some(v.as_deref().map(predicate).unwrap_or(false)))
            .collect::<BooleanArray>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::batch::{cell, Cell};
    use arrow::array::StringArray;

    fn pitch_feed() -> RecordBatch {
        // Two plate appearances by the same pitcher, given out of order.
        RecordBatch::try_from_iter(vec![
            ("game_pk", Arc::new(Int64Array::from(vec![745_001; 5])) as ArrayRef),
            ("at_bat_number", Arc::new(Int64Array::from(vec![2, 1, 2, 2, 1])) as ArrayRef),
            ("pitch_number", Arc::new(Int64Array::from(vec![3, 1, 1, 2, 2])) as ArrayRef),
            ("pitcher", Arc::new(Int64Array::from(vec![477_132; 5])) as ArrayRef),
            ("batter", Arc::new(Int64Array::from(vec![1, 2, 1, 1, 2])) as ArrayRef),
            (
                "description",
                Arc::new(StringArray::from(vec![
                    "hit_into_play",
                    "ball",
                    "swinging_strike",
                    "foul",
                    "called_strike",
                ])) as ArrayRef,
            ),
            (
                "events",
                Arc::new(StringArray::from(vec![
                    Some("double_play"),
                    None,
                    None,
                    None,
                    Some("strikeout"),
                ])) as ArrayRef,
            ),
            ("bat_score", Arc::new(Int64Array::from(vec![2, 1, 2, 2, 1])) as ArrayRef),
            ("post_bat_score", Arc::new(Int64Array::from(vec![1, 1, 2, 2, 1])) as ArrayRef),
        ])
        .unwrap()
    }

    fn int(batch: &RecordBatch, column: &str, row: usize) -> i64 {
        match cell(batch.column_by_name(column).unwrap().as_ref(), row) {
            Cell::Int(v) => v,
            other => panic!("{column}[{row}] is {other:?}"),
        }
    }

    #[test]
    fn test_one_row_per_plate_appearance() {
        let out = build_at_bats(pitch_feed()).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert_eq!(int(&out, "game_counter", 0), 1);
        assert_eq!(int(&out, "game_counter", 1), 2);
        assert_eq!(int(&out, "total_pitches", 1), 3);
        assert_eq!(int(&out, "last_pitch_number", 1), 3);
    }

    #[test]
    fn test_flag_totals_and_outcomes() {
        let out = build_at_bats(pitch_feed()).unwrap();
        assert_eq!(int(&out, "total_called_strikes", 0), 1);
        assert_eq!(int(&out, "total_swings", 1), 3);
        assert_eq!(int(&out, "total_whiffs", 1), 1);
        assert_eq!(int(&out, "total_fouls", 1), 1);
        assert_eq!(int(&out, "outs_on_ab", 1), 2);

        let strikeout = bool_values(out.column_by_name("is_strikeout").unwrap().as_ref());
        let bip = bool_values(out.column_by_name("is_bip").unwrap().as_ref());
        assert_eq!(strikeout, vec![Some(true), Some(false)]);
        assert_eq!(bip, vec![Some(false), Some(true)]);
    }

    #[test]
    fn test_pitcher_ordinal_and_clamped_rbi() {
        let out = build_at_bats(pitch_feed()).unwrap();
        assert_eq!(int(&out, "pitcher_pa_number", 0), 1);
        assert_eq!(int(&out, "pitcher_pa_number", 1), 2);
        // post_bat_score below bat_score clamps to zero.
        assert_eq!(int(&out, "rbi", 1), 0);
    }

    #[test]
    fn test_missing_scores_fail_the_build() {
        let feed = pitch_feed();
        let idx = feed.schema().index_of("post_bat_score").unwrap();
        let keep: Vec<usize> = (0..feed.num_columns()).filter(|i| *i != idx).collect();
        let err = build_at_bats(feed.project(&keep).unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::BuilderError { .. }));
    }
}
