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

//! # Pitch and Plate-Appearance Outcomes
//!
//! Fixed lookup tables from Statcast's categorical `description` (what
//! happened on a pitch) and `events` (how a plate appearance ended) to the
//! flags and labels the warehouse stores. Matching is case-insensitive; a
//! missing value maps to `false` for flags and to null for labels.

use crate::domain::errors::DeriveError;
use crate::engine::batch::text_values;
use arrow::array::{ArrayRef, BooleanArray, StringArray};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

const WHIFF: &[&str] = &["swinging_strike", "swinging_strike_blocked", "foul_tip"];
const BALL: &[&str] = &["ball", "blocked_ball", "automatic_ball"];
const BUNT_STRIKE: &[&str] = &["bunt_foul_tip", "foul_bunt", "missed_bunt"];
const SWING: &[&str] = &[
    "swinging_strike",
    "hit_into_play",
    "swinging_strike_blocked",
    "foul_tip",
    "foul",
    "foul_bunt",
    "bunt_foul_tip",
    "missed_bunt",
];
const WALK: &[&str] = &["intent_walk", "walk"];
const STRIKEOUT: &[&str] = &["strikeout", "strikeout_double_play"];

/// Outs recorded by a plate appearance, by terminal event.
const OUTS_BY_EVENT: &[(&str, i64)] = &[
    ("field_out", 1),
    ("strikeout", 1),
    ("double_play", 2),
    ("force_out", 1),
    ("strikeout_double_play", 2),
    ("sac_bunt", 1),
    ("fielders_choice_out", 1),
    ("sac_fly", 1),
    ("grounded_into_double_play", 2),
    ("fielders_choice", 1),
    ("triple_play", 3),
];

fn is_one_of(value: &str, set: &[&str]) -> bool {
    let lower = value.to_ascii_lowercase();
    set.contains(&lower.as_str())
}

pub fn map_pitch_result(description: &str) -> &'static str {
    let desc = description.to_ascii_lowercase();
    match desc.as_str() {
        d if WHIFF.contains(&d) => "whiff",
        "called_strike" => "called_strike",
        "automatic_strike" => "automatic_strike",
        d if BALL.contains(&d) => "ball",
        "hit_into_play" => "in_play",
        "foul" => "foul",
        "hit_by_pitch" => "hit_by_pitch",
        d if BUNT_STRIKE.contains(&d) => "bunt_strike",
        _ => "others",
    }
}

pub fn is_bip(description: &str) -> bool {
    description.eq_ignore_ascii_case("hit_into_play")
}

pub fn is_whiff(description: &str) -> bool {
    is_one_of(description, WHIFF)
}

pub fn is_called_strike(description: &str) -> bool {
    description.eq_ignore_ascii_case("called_strike")
}

pub fn is_ball(description: &str) -> bool {
    is_one_of(description, BALL)
}

pub fn is_swing(description: &str) -> bool {
    is_one_of(description, SWING)
}

pub fn is_foul(description: &str) -> bool {
    description.eq_ignore_ascii_case("foul")
}

pub fn is_walk(events: &str) -> bool {
    is_one_of(events, WALK)
}

pub fn is_strikeout(events: &str) -> bool {
    is_one_of(events, STRIKEOUT)
}

pub fn is_homerun(events: &str) -> bool {
    events.eq_ignore_ascii_case("home_run")
}

/// Outs on the play; events not in the table record none.
pub fn outs_on_event(events: Option<&str>) -> i64 {
    events
        .and_then(|e| OUTS_BY_EVENT.iter().find(|(name, _)| *name == e))
        .map(|(_, outs)| *outs)
        .unwrap_or(0)
}

/// Maps a text column through a flag predicate. Nulls map to `false`.
pub fn flag_column(
    batch: &RecordBatch,
    column: &str,
    predicate: fn(&str) -> bool,
) -> Result<ArrayRef, DeriveError> {
    let values = batch
        .column_by_name(column)
        .map(|c| text_values(c.as_ref()))
        .ok_or_else(|| DeriveError::MissingDependency(column.to_string()))?;
    let flags: BooleanArray = values
        .iter()
        .map(|v| Some(v.as_deref().map(predicate).unwrap_or(false)))
        .collect();
    Ok(Arc::new(flags))
}

pub fn derive_pitch_result_type(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    let values = batch
        .column_by_name("description")
        .map(|c| text_values(c.as_ref()))
        .ok_or_else(|| DeriveError::MissingDependency("description".to_string()))?;
    let labels: StringArray = values
        .iter()
        .map(|v| v.as_deref().map(map_pitch_result))
        .collect();
    Ok(Arc::new(labels))
}

pub fn derive_is_bip(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    flag_column(batch, "description", is_bip)
}

pub fn derive_is_whiff(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    flag_column(batch, "description", is_whiff)
}

pub fn derive_is_called_strike(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    flag_column(batch, "description", is_called_strike)
}

pub fn derive_is_ball(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    flag_column(batch, "description", is_ball)
}

pub fn derive_is_swing(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    flag_column(batch, "description", is_swing)
}

pub fn derive_is_foul(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    flag_column(batch, "description", is_foul)
}

pub fn derive_is_homerun(batch: &RecordBatch) -> Result<ArrayRef, DeriveError> {
    flag_column(batch, "events", is_homerun)
}
