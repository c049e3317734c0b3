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

//! The application logic that drives one load run.
//!
//! A run reads one input batch and loads it into every requested table in
//! parallel. Per table: builder (if any), contract enforcement, destination
//! column lookup, alignment, chunked upsert. A failing table is reported and
//! does not stop the others.

use crate::config::LoadConfig;
use crate::contracts::{Catalog, TableRegistration};
use crate::domain::entities::{DestinationColumn, LoadSummary};
use crate::domain::errors::{LoadError, Result};
use crate::domain::kind_mapper::map_kind_to_pg_udt;
use crate::engine::alignment::align;
use crate::engine::enforcement::apply;
use crate::engine::loader::upsert;
use crate::infrastructure::memory::memory_warehouse_adapter::MemoryWarehouse;
use crate::ports::batch_source::BatchSource;
use crate::ports::warehouse_port::WarehousePort;
use arrow::record_batch::RecordBatch;
use log::{error, info};
use rayon::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub struct LoadOrchestrator {
    warehouse: Arc<dyn WarehousePort>,
    catalog: Catalog,
    batch_size: usize,
    report_dir: String,
}

impl LoadOrchestrator {
    pub fn new(warehouse: Arc<dyn WarehousePort>, catalog: Catalog, config: &LoadConfig) -> Self {
        Self {
            warehouse,
            catalog,
            batch_size: config.batch_size,
            report_dir: config.report_dir.clone(),
        }
    }

    /// Loads `keys` from `source`, writes the run report and returns one summary per table.
    ///
    /// Unknown keys fail the whole run before anything is read.
    pub fn run(&self, keys: &[String], source: &dyn BatchSource) -> Result<Vec<LoadSummary>> {
        let start_time = Instant::now();
        let registrations = keys
            .iter()
            .map(|k| self.catalog.get(k))
            .collect::<Result<Vec<_>>>()?;

        if registrations.is_empty() {
            info!("No tables requested.");
            return Ok(vec![]);
        }

        let batch = source.read_batch()?;
        info!(
            "Loading {} rows from {} into {} tables",
            batch.num_rows(),
            source.describe(),
            registrations.len()
        );

        let results: Vec<LoadSummary> = registrations
            .into_par_iter()
            .map(|registration| {
                match self.transform_and_load(registration, batch.clone()) {
                    Ok(summary) => summary,
                    Err(e) => {
                        error!("Table {} failed: {}", registration.key, e);
                        LoadSummary::failure(
                            &registration.key,
                            registration.target().qualified_name(),
                            e.to_string(),
                        )
                    }
                }
            })
            .collect();

        self.generate_report(&results, &source.describe(), start_time.elapsed().as_secs_f64())?;
        Ok(results)
    }

    /// Builds, enforces, aligns and upserts one batch into one table.
    pub fn transform_and_load(
        &self,
        registration: &TableRegistration,
        batch: RecordBatch,
    ) -> Result<LoadSummary> {
        let start = Instant::now();
        let target = registration.target();
        info!("Processing {} into {}", registration.key, target.qualified_name());

        let batch = match registration.builder {
            Some(build) => build(batch)?,
            None => batch,
        };
        let (clean, report) = apply(batch, &registration.contract)?;

        let db_columns = self.warehouse.table_columns(&target.schema, &target.table)?;
        if db_columns.is_empty() {
            return Err(LoadError::MetadataError(format!(
                "{} does not exist or has no columns",
                target.qualified_name()
            )));
        }
        let names: Vec<String> = db_columns.iter().map(|c| c.name.clone()).collect();
        let aligned = align(&clean, &target.table, &names)?;

        let rows = upsert(
            self.warehouse.as_ref(),
            &aligned,
            &target,
            &db_columns,
            self.batch_size,
        )?;

        let duration = start.elapsed().as_secs_f64();
        info!(
            "{}: {} rows loaded into {} in {:.2}s",
            registration.key,
            rows,
            target.qualified_name(),
            duration
        );
        Ok(LoadSummary::success(
            &registration.key,
            target.qualified_name(),
            rows,
            db_columns.len(),
            duration,
            report,
        ))
    }

    fn generate_report(&self, results: &[LoadSummary], input: &str, duration_secs: f64) -> Result<PathBuf> {
        let success = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - success;
        let total_rows: u64 = results.iter().map(|r| r.rows_loaded).sum();

        let report = json!({
            "summary": {
                "input": input,
                "total_tables": results.len(),
                "success": success,
                "failed": failed,
                "total_rows": total_rows,
                "total_duration_seconds": duration_secs,
            },
            "details": results
        });

        std::fs::create_dir_all(&self.report_dir)?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%6f");
        let dir = PathBuf::from(&self.report_dir);
        let mut report_path = dir.join(format!("report_{}.json", timestamp));
        let mut attempt = 1;
        // Runs started within the same microsecond get a numeric suffix.
        while report_path.exists() {
            report_path = dir.join(format!("report_{}_{}.json", timestamp, attempt));
            attempt += 1;
        }
        let file = std::fs::File::create(&report_path)?;
        serde_json::to_writer_pretty(file, &report)?;

        info!("Run report written to {}", report_path.display());
        Ok(report_path)
    }
}

/// An in-memory warehouse with every catalog table created from its contract.
pub fn dry_run_warehouse(catalog: &Catalog) -> MemoryWarehouse {
    let warehouse = MemoryWarehouse::new();
    for registration in catalog.registrations() {
        let columns = registration
            .contract
            .columns
            .iter()
            .map(|c| DestinationColumn::new(&c.name, map_kind_to_pg_udt(c.kind)))
            .collect();
        warehouse.register_table(&registration.schema, &registration.table, columns);
    }
    warehouse
}
