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

//! # Table Catalog
//!
//! Every contract the pipeline knows, and where each one is loaded. The
//! catalog is built (and every contract validated) once at startup; after
//! that it is read-only and shared freely across worker threads.

pub mod boxscores;
pub mod dimensions;
pub mod outcomes;
pub mod satellites;
pub mod statcast_at_bats;
pub mod statcast_batted_balls;
pub mod statcast_common;
pub mod statcast_pitches;

use crate::builders::{at_bats::build_at_bats, dim_game::build_dim_game};
use crate::domain::contract::TableContract;
use crate::domain::entities::LoadTarget;
use crate::domain::errors::{LoadError, Result};
use arrow::record_batch::RecordBatch;

/// Reshapes a source batch to the granularity of its table before enforcement.
pub type Builder = fn(RecordBatch) -> Result<RecordBatch>;

/// One loadable table: its contract and where it lives.
#[derive(Debug, Clone)]
pub struct TableRegistration {
    pub key: String,
    pub contract: TableContract,
    pub schema: String,
    pub table: String,
    pub constraint: String,
    pub builder: Option<Builder>,
}

impl TableRegistration {
    fn new(schema: &str, contract: TableContract, builder: Option<Builder>) -> Self {
        let table = contract.name.clone();
        Self {
            key: table.clone(),
            constraint: format!("{}_pkey", table),
            schema: schema.to_string(),
            table,
            contract,
            builder,
        }
    }

    pub fn target(&self) -> LoadTarget {
        LoadTarget {
            schema: self.schema.clone(),
            table: self.table.clone(),
            constraint: self.constraint.clone(),
            primary_key: self.contract.primary_key.clone(),
            defaulted_columns: self
                .contract
                .columns
                .iter()
                .filter(|c| c.is_identity || c.server_default.is_some())
                .map(|c| c.name.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    registrations: Vec<TableRegistration>,
}

impl Catalog {
    /// The warehouse's staging and production tables.
    pub fn standard() -> Result<Self> {
        let staging = "staging";
        let production = "production";
        Ok(Self {
            registrations: vec![
                TableRegistration::new(staging, statcast_pitches::contract()?, None),
                TableRegistration::new(staging, statcast_batted_balls::contract()?, None),
                TableRegistration::new(
                    staging,
                    statcast_at_bats::contract()?,
                    Some(build_at_bats as Builder),
                ),
                TableRegistration::new(staging, boxscores::pitching_contract()?, None),
                TableRegistration::new(staging, boxscores::batting_contract()?, None),
                TableRegistration::new(production, dimensions::dim_player_contract()?, None),
                TableRegistration::new(production, dimensions::dim_team_contract()?, None),
                TableRegistration::new(
                    production,
                    dimensions::dim_game_contract()?,
                    Some(build_dim_game as Builder),
                ),
                TableRegistration::new(production, satellites::sat_pitch_shape_contract()?, None),
                TableRegistration::new(production, satellites::sat_batted_balls_contract()?, None),
            ],
        })
    }

    pub fn get(&self, key: &str) -> Result<&TableRegistration> {
        self.registrations
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| LoadError::UnknownTable(format!("{} (options: {})", key, self.keys().join(", "))))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.key.as_str()).collect()
    }

    pub fn registrations(&self) -> &[TableRegistration] {
        &self.registrations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_builds_and_names_constraints() {
        let catalog = Catalog::standard().unwrap();
        let pitches = catalog.get("statcast_pitches").unwrap();
        assert_eq!(pitches.schema, "staging");
        assert_eq!(pitches.constraint, "statcast_pitches_pkey");
        assert!(pitches.builder.is_none());
        assert!(catalog.get("statcast_at_bats").unwrap().builder.is_some());
        assert_eq!(catalog.get("dim_game").unwrap().schema, "production");
    }

    #[test]
    fn test_unknown_table_lists_options() {
        let catalog = Catalog::standard().unwrap();
        let err = catalog.get("fact_pitch").unwrap_err();
        assert!(matches!(err, LoadError::UnknownTable(_)));
        assert!(err.to_string().contains("statcast_pitches"));
    }

    #[test]
    fn test_target_lists_defaulted_columns() {
        let catalog = Catalog::standard().unwrap();
        let target = catalog.get("pitching_boxscores").unwrap().target();
        assert_eq!(target.defaulted_columns, vec!["ingested_at", "load_id"]);
        assert_eq!(target.primary_key, vec!["game_pk", "pitcher_id", "team_id"]);
    }
}
