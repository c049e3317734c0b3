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

//! # Warehouse Alignment
//!
//! Reshapes a cleaned batch to the live column list of its destination.
//! The destination is authoritative: missing columns are added as nulls,
//! extra columns are dropped, and the order follows the table.

use crate::domain::errors::Result;
use crate::engine::batch::{assemble, column_names};
use arrow::array::{new_null_array, ArrayRef};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use log::{debug, warn};

pub fn align(batch: &RecordBatch, table: &str, destination_columns: &[String]) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let mut fields = Vec::with_capacity(destination_columns.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(destination_columns.len());
    let mut added = Vec::new();

    for name in destination_columns {
        match batch.column_by_name(name) {
            Some(array) => {
                fields.push(Field::new(name, array.data_type().clone(), true));
                columns.push(array.clone());
            }
            None => {
                added.push(name.as_str());
                fields.push(Field::new(name, DataType::Utf8, true));
                columns.push(new_null_array(&DataType::Utf8, rows));
            }
        }
    }

    let dropped: Vec<String> = column_names(batch)
        .into_iter()
        .filter(|c| !destination_columns.contains(c))
        .collect();

    if !added.is_empty() {
        debug!("[{}] Destination columns absent from batch, filled with nulls: {:?}", table, added);
    }
    if !dropped.is_empty() {
        warn!("[{}] Batch columns not present in destination, dropped: {:?}", table, dropped);
    }

    assemble(rows, fields, columns)
}
