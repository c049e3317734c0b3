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

//! # Box Score Contracts
//!
//! Per-game pitching and batting lines, one row per player appearance for
//! one team. Both tables stamp their load with a server-side timestamp and
//! load id.

use crate::domain::contract::{ColumnContract, ColumnKind, TableContract};
use crate::domain::errors::Result;

fn counting(name: &str, high: f64) -> ColumnContract {
    ColumnContract::new(name, ColumnKind::Int16).bounds(0.0, high)
}

fn load_metadata_columns() -> Vec<ColumnContract> {
    vec![
        ColumnContract::new("source", ColumnKind::Text),
        ColumnContract::new("ingested_at", ColumnKind::Timestamp).server_default("now()"),
        ColumnContract::new("load_id", ColumnKind::Uuid).server_default("gen_random_uuid()"),
    ]
}

pub fn pitching_contract() -> Result<TableContract> {
    use ColumnKind::*;
    let mut columns = vec![
        ColumnContract::new("game_pk", Int64).primary_key(),
        ColumnContract::new("pitcher_id", Int64).primary_key(),
        ColumnContract::new("team_id", Int64).primary_key(),
        ColumnContract::new("team_name", Text),
        ColumnContract::new("pitcher_name", Text),
        ColumnContract::new("is_starter", Boolean),
        counting("fly_outs", 35.0),
        counting("ground_outs", 35.0),
        counting("air_outs", 35.0),
        counting("runs", 150.0),
        counting("doubles", 100.0),
        counting("triples", 30.0),
        counting("home_runs", 40.0),
        counting("strike_outs", 40.0),
        counting("walks", 30.0),
        counting("intentional_walks", 30.0),
        counting("hits", 45.0),
        counting("hit_by_pitch", 15.0),
        counting("at_bats", 45.0),
        counting("caught_stealing", 20.0),
        counting("stolen_bases", 30.0),
        ColumnContract::new("stolen_base_pct", Float64).bounds(0.0, 100.0),
        ColumnContract::new("number_of_pitches", Int16).bounds(1.0, 150.0),
        // Baseball notation: "5.2" is five and two thirds innings.
        ColumnContract::new("innings_pitched", Float64).bounds(0.0, 12.0),
        counting("wins", 1.0),
        counting("losses", 1.0),
        counting("saves", 1.0),
        counting("save_opportunities", 1.0),
        counting("holds", 1.0),
        counting("blown_saves", 1.0),
        counting("earned_runs", 20.0),
        ColumnContract::new("batters_faced", Int16).bounds(1.0, 40.0),
        counting("outs", 50.0),
        ColumnContract::new("complete_game", Boolean),
        ColumnContract::new("shutout", Boolean),
        counting("balls", 50.0),
        counting("strikes", 80.0),
        ColumnContract::new("strike_pct", Float64).bounds(0.0, 100.0),
        counting("hit_batsmen", 15.0),
        counting("balks", 50.0),
        counting("wild_pitches", 100.0),
        counting("pickoffs", 75.0),
        counting("rbi", 50.0),
        ColumnContract::new("games_finished", Boolean),
        ColumnContract::new("runs_scored_per_9", Float64).bounds(0.0, 150.0),
        ColumnContract::new("home_runs_per_9", Float64).bounds(0.0, 50.0),
        counting("inherited_runners", 3.0),
        counting("inherited_runners_scored", 3.0),
        counting("catchers_interference", 40.0),
        counting("sac_bunts", 40.0),
        counting("sac_flies", 30.0),
        counting("passed_ball", 150.0),
        counting("pop_outs", 30.0),
        counting("line_outs", 50.0),
    ];
    columns.extend(load_metadata_columns());
    TableContract::new("pitching_boxscores", &["game_pk", "pitcher_id", "team_id"], columns)
}

pub fn batting_contract() -> Result<TableContract> {
    use ColumnKind::*;
    let mut columns = vec![
        ColumnContract::new("batter_id", Int64).primary_key(),
        ColumnContract::new("game_pk", Int64).primary_key(),
        ColumnContract::new("team_id", Int64).primary_key(),
        ColumnContract::new("batter_name", Text),
        ColumnContract::new("team_name", Text),
        ColumnContract::new("position", Text),
        counting("ground_outs", 10.0),
        counting("air_outs", 10.0),
        counting("runs", 8.0),
        counting("doubles", 8.0),
        counting("triples", 8.0),
        counting("home_runs", 6.0),
        counting("strike_outs", 8.0).renamed_from("strikeout"),
        counting("walks", 8.0),
        counting("intentional_walks", 6.0),
        counting("hits", 10.0),
        counting("hit_by_pitch", 10.0),
        counting("at_bats", 10.0),
        counting("caught_stealing", 5.0),
        counting("stolen_bases", 10.0).renamed_from("sb"),
        ColumnContract::new("stolen_base_pct", Float64)
            .bounds(0.0, 1.0)
            .renamed_from("sb_pct"),
        counting("plate_appearances", 10.0),
        counting("total_bases", 16.0),
        counting("rbi", 20.0),
        counting("errors", 20.0),
    ];
    columns.extend(load_metadata_columns());
    TableContract::new("batting_boxscores", &["batter_id", "team_id", "game_pk"], columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxscore_contracts_build() {
        let pitching = pitching_contract().unwrap();
        assert_eq!(pitching.column("innings_pitched").unwrap().kind, ColumnKind::Float64);
        assert_eq!(
            pitching.column("ingested_at").unwrap().server_default.as_deref(),
            Some("now()")
        );

        let batting = batting_contract().unwrap();
        assert_eq!(batting.primary_key, vec!["batter_id", "team_id", "game_pk"]);
        assert_eq!(batting.column("batter_name").unwrap().kind, ColumnKind::Text);
    }
}
