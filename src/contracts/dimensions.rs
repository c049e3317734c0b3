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

//! Production dimension tables, keyed by their natural identifiers.

use crate::domain::contract::{ColumnContract, ColumnKind, TableContract};
use crate::domain::errors::Result;

pub fn dim_player_contract() -> Result<TableContract> {
    use ColumnKind::*;
    TableContract::new(
        "dim_player",
        &["player_id"],
        vec![
            ColumnContract::new("player_id", Int64).primary_key(),
            ColumnContract::new("full_name", Text).required(),
            ColumnContract::new("team_id", Int64).required(),
            ColumnContract::new("first_name", Text),
            ColumnContract::new("last_name", Text),
            ColumnContract::new("birth_date", Date),
            ColumnContract::new("age", Int16),
            ColumnContract::new("height", Text),
            ColumnContract::new("weight", Int16),
            ColumnContract::new("active", Boolean),
            ColumnContract::new("primary_position_code", Int16),
            ColumnContract::new("primary_position", Text),
            ColumnContract::new("draft_year", Int16),
            ColumnContract::new("mlb_debut_date", Date),
            ColumnContract::new("bat_side", Text),
            ColumnContract::new("pitch_hand", Text),
            ColumnContract::new("sz_top", Float64),
            ColumnContract::new("sz_bot", Float64),
        ],
    )
}

pub fn dim_team_contract() -> Result<TableContract> {
    use ColumnKind::*;
    TableContract::new(
        "dim_team",
        &["team_id"],
        vec![
            ColumnContract::new("team_id", Int64).primary_key(),
            ColumnContract::new("team_name", Text).required(),
            ColumnContract::new("full_name", Text),
            ColumnContract::new("abbreviation", Text),
            ColumnContract::new("venue", Text),
            ColumnContract::new("division", Text),
            ColumnContract::new("division_id", Int64),
            ColumnContract::new("location", Text),
        ],
    )
}

pub fn dim_game_contract() -> Result<TableContract> {
    use ColumnKind::*;
    TableContract::new(
        "dim_game",
        &["game_pk"],
        vec![
            ColumnContract::new("game_pk", Int64).primary_key(),
            ColumnContract::new("game_date", Date).required(),
            ColumnContract::new("game_type", Text),
            ColumnContract::new("home_team", Text),
            ColumnContract::new("away_team", Text),
        ],
    )
}
