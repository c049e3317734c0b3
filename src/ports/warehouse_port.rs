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

//! # Warehouse Port
//!
//! This Port defines what the load path needs from the relational warehouse.
//! It doesn't care IF the warehouse is PostgreSQL or an in-memory table map
//! used by tests. Any struct that implements `WarehousePort` can be handed
//! to the loader and the orchestrator.

use crate::domain::entities::{DestinationColumn, LoadTarget};
use crate::domain::errors::Result;
use arrow::record_batch::RecordBatch;

/// `WarehousePort` is shared across worker threads, hence `Send + Sync`.
pub trait WarehousePort: Send + Sync {
    /// Returns the live columns of a table, in physical order.
    ///
    /// An empty list means the table does not exist.
    fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<DestinationColumn>>;

    /// Inserts one chunk, resolving conflicts on `target.constraint`.
    ///
    /// The chunk's columns are exactly `columns`, in that order. Key columns
    /// are never null. For every other column the stored value wins when it
    /// is non-null, otherwise the incoming value is taken. The chunk is
    /// applied atomically; the return value is the number of rows written.
    fn upsert_chunk(
        &self,
        target: &LoadTarget,
        columns: &[DestinationColumn],
        chunk: &RecordBatch,
    ) -> Result<u64>;

    /// Runs a SQL script in a single transaction.
    fn execute_script(&self, script: &str) -> Result<u64>;

    /// Upper bound on bind parameters per statement, if the backend has one.
    fn max_bind_parameters(&self) -> Option<usize> {
        None
    }
}
