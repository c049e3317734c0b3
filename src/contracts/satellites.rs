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

//! # Production Satellites
//!
//! Wide attribute tables hanging off `fact_pitch` by its surrogate
//! `pitch_id`. They are normally filled by SQL transforms; the contracts
//! exist so direct loads and generated DDL agree with them.

use crate::domain::contract::{ColumnContract, ColumnKind, TableContract};
use crate::domain::errors::Result;

fn real(name: &str, low: f64, high: f64) -> ColumnContract {
    ColumnContract::new(name, ColumnKind::Float64).bounds(low, high)
}

fn created_at() -> ColumnContract {
    ColumnContract::new("created_at", ColumnKind::Timestamp)
        .required()
        .server_default("now()")
}

pub fn sat_pitch_shape_contract() -> Result<TableContract> {
    TableContract::new(
        "sat_pitch_shape",
        &["pitch_id"],
        vec![
            ColumnContract::new("pitch_id", ColumnKind::Int64).primary_key(),
            real("release_pos_x", -6.0, 6.0),
            real("release_pos_y", 46.0, 60.0),
            real("release_pos_z", 2.5, 9.0),
            real("release_spin_rate", 500.0, 3500.0),
            real("release_extension", 3.5, 9.0),
            real("release_speed", 20.0, 108.0),
            real("spin_axis", 0.0, 360.0),
            real("pfx_x", -5.0, 5.0),
            real("pfx_z", -4.5, 4.5),
            real("vx0", -30.0, 30.0),
            real("vy0", -180.0, -50.0),
            real("vz0", -30.0, 30.0),
            real("ax", -50.0, 50.0),
            real("ay", 0.0, 50.0),
            real("az", -60.0, 20.0),
            real("plate_x", -3.0, 3.0),
            real("plate_z", 0.0, 7.0),
            ColumnContract::new("sz_top", ColumnKind::Float64),
            ColumnContract::new("sz_bot", ColumnKind::Float64),
            created_at(),
        ],
    )
}

pub fn sat_batted_balls_contract() -> Result<TableContract> {
    use ColumnKind::*;
    TableContract::new(
        "sat_batted_balls",
        &["pitch_id"],
        vec![
            ColumnContract::new("pitch_id", Int64).primary_key(),
            ColumnContract::new("pa_id", Int64),
            ColumnContract::new("bb_type", Text),
            ColumnContract::new("events", Text),
            real("launch_speed", 30.0, 135.0),
            real("launch_angle", -90.0, 100.0),
            real("hit_distance_sc", 0.0, 550.0),
            real("hc_x", 0.0, 275.0),
            real("hc_y", 0.0, 275.0),
            real("hc_x_centered", -150.0, 150.0),
            ColumnContract::new("is_homerun", Boolean),
            real("xba", 0.0, 1.0),
            real("xslg", 0.0, 4.0),
            real("xwoba", 0.0, 2.2),
            real("woba_value", 0.0, 2.5),
            ColumnContract::new("babip_value", Int16).bounds(0.0, 1.0),
            ColumnContract::new("iso_value", Int16).bounds(0.0, 3.0),
            ColumnContract::new("hit_location", Int16).bounds(1.0, 9.0),
            ColumnContract::new("hard_hit", Boolean),
            ColumnContract::new("sweet_spot", Boolean),
            ColumnContract::new("ideal_contact", Boolean),
            ColumnContract::new("la_band", Text),
            ColumnContract::new("ev_band", Text),
            ColumnContract::new("spray_bucket", Text),
            created_at(),
        ],
    )
}
