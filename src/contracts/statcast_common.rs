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

//! Columns shared by every pitch-level staging table.

use crate::domain::contract::{ColumnContract, ColumnKind};

/// `game_counter` is Statcast's `at_bat_number`: the plate appearance's
/// ordinal within the whole game.
pub fn common_pitch_columns() -> Vec<ColumnContract> {
    vec![
        ColumnContract::new("game_pk", ColumnKind::Int64).primary_key(),
        ColumnContract::new("game_counter", ColumnKind::Int64)
            .primary_key()
            .bounds(1.0, 185.0)
            .renamed_from("at_bat_number"),
        ColumnContract::new("game_date", ColumnKind::Date),
        ColumnContract::new("pitcher", ColumnKind::Int64).required(),
        ColumnContract::new("batter", ColumnKind::Int64).required(),
    ]
}
