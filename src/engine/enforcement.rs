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

//! # Contract Enforcement Engine
//!
//! `apply` turns an arbitrary incoming batch into one that honours a
//! `TableContract`, and reports every anomaly it degraded along the way.
//!
//! The steps run in a fixed order because each one reads the output of the
//! previous one:
//! 1. legacy renames
//! 2. per-column derive / coerce / bound, in declaration order
//! 3. table rules
//! 4. row filters
//! 5. not-null audit (advisory)
//! 6. primary-key presence check (the only hard failure)
//! 7. primary-key deduplication

use crate::domain::contract::{ColumnContract, TableContract};
use crate::domain::errors::{DeriveError, Result};
use crate::domain::report::{DerivationStatus, EnforcementReport};
use crate::engine::batch::{has_column, null_count, readable_columns, rename_columns, with_column};
use crate::engine::coercion::{apply_bounds, coerce};
use crate::engine::dedupe::dedupe;
use arrow::array::ArrayRef;
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use log::{debug, info, warn};

/// Applies `contract` to `batch`, returning the cleaned batch and its report.
pub fn apply(batch: RecordBatch, contract: &TableContract) -> Result<(RecordBatch, EnforcementReport)> {
    let mut report = EnforcementReport::new(&contract.name, batch.num_rows());

    let batch = readable_columns(&batch)?;
    let mut batch = apply_renames(batch, contract)?;

    for column in &contract.columns {
        batch = enforce_column(batch, column, &mut report)?;
    }

    for rule in &contract.table_rules {
        let outcome = rule(batch)?;
        report.add_violations(&outcome.violations);
        batch = outcome.batch;
    }

    for filter in &contract.row_filters {
        let keep = filter(&batch)?;
        batch = filter_record_batch(&batch, &keep)?;
    }

    for column in contract.columns.iter().filter(|c| !c.nullable) {
        if let Some(array) = batch.column_by_name(&column.name) {
            let nulls = null_count(array.as_ref());
            if nulls > 0 {
                report.not_nullable_violations.insert(column.name.clone(), nulls);
            }
        }
    }

    let deduped = dedupe(&batch, &contract.name, &contract.primary_key)?;
    report.duplicates_dropped = deduped.dropped;
    report.duplicate_key_sample = deduped.sample;
    let batch = deduped.batch;

    report.rows_out = batch.num_rows();
    report.columns_out = batch.num_columns();

    if !report.missing_required_columns.is_empty() {
        warn!(
            "[{}] Required columns missing from batch: {:?}",
            contract.name, report.missing_required_columns
        );
    }
    info!(
        "[{}] Enforced contract: {} rows in, {} rows out, {} bound violations, {} rule violations",
        contract.name,
        report.rows_in,
        report.rows_out,
        report.total_bound_violations(),
        report.total_rule_violations()
    );

    Ok((batch, report))
}

/// Renames legacy columns, once, and only when the canonical name is absent.
fn apply_renames(batch: RecordBatch, contract: &TableContract) -> Result<RecordBatch> {
    let renames: Vec<(String, String)> = contract
        .columns
        .iter()
        .filter_map(|c| {
            let legacy = c.original_name.as_ref()?;
            (!has_column(&batch, &c.name) && has_column(&batch, legacy))
                .then(|| (legacy.clone(), c.name.clone()))
        })
        .collect();

    if renames.is_empty() {
        return Ok(batch);
    }
    debug!("[{}] Renaming legacy columns: {:?}", contract.name, renames);
    rename_columns(&batch, &renames)
}

fn enforce_column(
    batch: RecordBatch,
    column: &ColumnContract,
    report: &mut EnforcementReport,
) -> Result<RecordBatch> {
    let source: ArrayRef = match column.derive {
        Some(derive) => match derive(&batch) {
            Ok(values) if values.len() == batch.num_rows() => {
                report
                    .derived_columns
                    .insert(column.name.clone(), DerivationStatus::Derived);
                values
            }
            Ok(values) => {
                let err = DeriveError::LengthMismatch {
                    expected: batch.num_rows(),
                    got: values.len(),
                };
                warn!("[{}] Derivation of '{}' failed: {}", report.table, column.name, err);
                report
                    .derived_columns
                    .insert(column.name.clone(), DerivationStatus::Failed(err.to_string()));
                return Ok(batch);
            }
            Err(DeriveError::MissingDependency(dep)) => {
                debug!(
                    "[{}] Skipping derived column '{}': missing dependency '{}'",
                    report.table, column.name, dep
                );
                report
                    .derived_columns
                    .insert(column.name.clone(), DerivationStatus::FailedMissingDep(dep));
                return Ok(batch);
            }
            Err(err) => {
                report
                    .derived_columns
                    .insert(column.name.clone(), DerivationStatus::Failed(err.to_string()));
                return Ok(batch);
            }
        },
        None => match batch.column_by_name(&column.name) {
            Some(array) => array.clone(),
            None => {
                if !column.nullable {
                    report.missing_required_columns.push(column.name.clone());
                }
                return Ok(batch);
            }
        },
    };

    let mut coerced = coerce(source.as_ref(), column.kind);
    report.type_coercions.insert(column.name.clone(), column.kind);

    if let (Some((low, high)), true) = (column.bounds, column.kind.is_numeric()) {
        let (bounded, violations) = apply_bounds(&coerced, low, high)?;
        report.invalid_bounds.insert(column.name.clone(), violations);
        coerced = bounded;
    }

    with_column(&batch, &column.name, coerced)
}
