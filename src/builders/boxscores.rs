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

//! # Box Score Flattening
//!
//! Turns landed MLB Stats API box score payloads into one record per player
//! appearance. A payload nests `teams.{away,home}` each with a `team` and a
//! `players` map whose entries carry `person` and `stats.{pitching,batting}`.
//! Any level may be absent; a missing value becomes a null cell.
//!
//! The output is a batch of text columns. Types are assigned later by the
//! box score contracts.

use crate::domain::errors::Result;
use crate::engine::batch::text_batch;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BOXSCORE_SOURCE: &str = "MLB_stats_api";

/// A landed payload, as stored in `raw.landing_boxscores`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxscorePayload {
    pub game_pk: i64,
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxscoreKind {
    Pitching,
    Batting,
}

/// Column name and the API stat it is read from.
const PITCHING_STATS: &[(&str, &str)] = &[
    ("is_starter", "gamesStarted"),
    ("fly_outs", "flyOuts"),
    ("ground_outs", "groundOuts"),
    ("air_outs", "airOuts"),
    ("runs", "runs"),
    ("doubles", "doubles"),
    ("triples", "triples"),
    ("home_runs", "homeRuns"),
    ("strike_outs", "strikeOuts"),
    ("walks", "baseOnBalls"),
    ("intentional_walks", "intentionalWalks"),
    ("hits", "hits"),
    ("hit_by_pitch", "hitByPitch"),
    ("at_bats", "atBats"),
    ("caught_stealing", "caughtStealing"),
    ("stolen_bases", "stolenBases"),
    ("stolen_base_pct", "stolenBasePercentage"),
    ("number_of_pitches", "numberOfPitches"),
    ("innings_pitched", "inningsPitched"),
    ("wins", "wins"),
    ("losses", "losses"),
    ("saves", "saves"),
    ("save_opportunities", "saveOpportunities"),
    ("holds", "holds"),
    ("blown_saves", "blownSaves"),
    ("earned_runs", "earnedRuns"),
    ("batters_faced", "battersFaced"),
    ("outs", "outs"),
    ("complete_game", "completeGames"),
    ("shutout", "shutouts"),
    ("balls", "balls"),
    ("strikes", "strikes"),
    ("strike_pct", "strikePercentage"),
    ("hit_batsmen", "hitBatsmen"),
    ("balks", "balks"),
    ("wild_pitches", "wildPitches"),
    ("pickoffs", "pickoffs"),
    ("rbi", "rbi"),
    ("games_finished", "gamesFinished"),
    ("runs_scored_per_9", "runsScoredPer9"),
    ("home_runs_per_9", "homeRunsPer9"),
    ("inherited_runners", "inheritedRunners"),
    ("inherited_runners_scored", "inheritedRunnersScored"),
    ("catchers_interference", "catchersInterference"),
    ("sac_bunts", "sacBunts"),
    ("sac_flies", "sacFlies"),
    ("passed_ball", "passedBall"),
    ("pop_outs", "popOuts"),
    ("line_outs", "lineOuts"),
];

const BATTING_STATS: &[(&str, &str)] = &[
    ("ground_outs", "groundOuts"),
    ("air_outs", "airOuts"),
    ("runs", "runs"),
    ("doubles", "doubles"),
    ("triples", "triples"),
    ("home_runs", "homeRuns"),
    ("strike_outs", "strikeOuts"),
    ("walks", "baseOnBalls"),
    ("intentional_walks", "intentionalWalks"),
    ("hits", "hits"),
    ("hit_by_pitch", "hitByPitch"),
    ("at_bats", "atBats"),
    ("caught_stealing", "caughtStealing"),
    ("stolen_bases", "stolenBases"),
    ("stolen_base_pct", "stolenBasePercentage"),
    ("plate_appearances", "plateAppearances"),
    ("total_bases", "totalBases"),
    ("rbi", "rbi"),
];

impl BoxscoreKind {
    fn stats_key(self) -> &'static str {
        match self {
            BoxscoreKind::Pitching => "pitching",
            BoxscoreKind::Batting => "batting",
        }
    }

    fn player_columns(self) -> [&'static str; 2] {
        match self {
            BoxscoreKind::Pitching => ["pitcher_id", "pitcher_name"],
            BoxscoreKind::Batting => ["batter_id", "batter_name"],
        }
    }

    fn stats(self) -> &'static [(&'static str, &'static str)] {
        match self {
            BoxscoreKind::Pitching => PITCHING_STATS,
            BoxscoreKind::Batting => BATTING_STATS,
        }
    }

    fn extra_columns(self) -> &'static [&'static str] {
        match self {
            BoxscoreKind::Pitching => &[],
            BoxscoreKind::Batting => &["position", "errors"],
        }
    }

    /// Output column order: identity, team, player, stats, source.
    pub fn column_names(self) -> Vec<String> {
        let [id, name] = self.player_columns();
        let mut names = vec![
            "game_pk".to_string(),
            "team_id".to_string(),
            "team_name".to_string(),
            id.to_string(),
            name.to_string(),
        ];
        names.extend(self.extra_columns().iter().map(|c| c.to_string()));
        names.extend(self.stats().iter().map(|(c, _)| c.to_string()));
        names.push("source".to_string());
        names
    }
}

/// Renders a JSON value as text; absent and null values read as null.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn non_empty_object(value: Option<&Value>) -> Option<&serde_json::Map<String, Value>> {
    value.and_then(Value::as_object).filter(|m| !m.is_empty())
}

/// One row (in `column_names` order) per player with stats of `kind`.
fn flatten_payload(game: &BoxscorePayload, kind: BoxscoreKind) -> Vec<Vec<Option<String>>> {
    let mut rows = Vec::new();
    for side in ["away", "home"] {
        let team_side = game.payload.pointer(&format!("/teams/{}", side));
        let team = team_side.and_then(|s| s.get("team"));
        let players = team_side
            .and_then(|s| s.get("players"))
            .and_then(Value::as_object);

        let Some(players) = players else { continue };
        for player in players.values() {
            let Some(stats) = non_empty_object(player.pointer(&format!("/stats/{}", kind.stats_key())))
            else {
                continue;
            };
            let person = player.get("person");

            let mut row = vec![
                Some(game.game_pk.to_string()),
                scalar_text(team.and_then(|t| t.get("id"))),
                scalar_text(team.and_then(|t| t.get("name"))),
                scalar_text(person.and_then(|p| p.get("id"))),
                scalar_text(person.and_then(|p| p.get("fullName"))),
            ];
            if kind == BoxscoreKind::Batting {
                row.push(scalar_text(player.pointer("/position/abbreviation")));
                row.push(scalar_text(player.pointer("/stats/fielding/errors")));
            }
            row.extend(kind.stats().iter().map(|(_, key)| scalar_text(stats.get(*key))));
            row.push(Some(BOXSCORE_SOURCE.to_string()));
            rows.push(row);
        }
    }
    rows
}

/// Flattens every payload into a text batch for `kind`.
pub fn flatten_boxscores(games: &[BoxscorePayload], kind: BoxscoreKind) -> Result<RecordBatch> {
    let names = kind.column_names();
    let rows: Vec<Vec<Option<String>>> = games
        .iter()
        .flat_map(|g| flatten_payload(g, kind))
        .collect();

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); names.len()];
    for row in &rows {
        for (column, value) in columns.iter_mut().zip(row.iter()) {
            column.push(value.clone());
        }
    }
    text_batch(&names, columns, rows.len())
}
