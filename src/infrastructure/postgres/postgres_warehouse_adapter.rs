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

//! Infrastructure adapter that reads table metadata from and writes batches
//! into a PostgreSQL warehouse.

use crate::domain::entities::{DestinationColumn, LoadTarget};
use crate::domain::errors::{LoadError, Result};
use crate::engine::batch::cell_text;
use crate::infrastructure::postgres::connection_manager::PostgresConnectionManager;
use crate::infrastructure::postgres::sql_utils::build_upsert_sql;
use crate::ports::warehouse_port::WarehousePort;
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use postgres::types::ToSql;
use postgres::SimpleQueryMessage;
use r2d2::{Pool, PooledConnection};
use std::sync::Arc;

/// Protocol limit on bind parameters in one statement.
pub const MAX_BIND_PARAMETERS: usize = 65535;

const SQL_TABLE_COLUMNS: &str = "
    SELECT column_name::text, udt_name::text
    FROM information_schema.columns
    WHERE table_schema = $1
      AND table_name = $2
    ORDER BY ordinal_position
";

/// Concrete implementation of `WarehousePort` for PostgreSQL.
pub struct PostgresWarehouseAdapter {
    pool: Arc<Pool<PostgresConnectionManager>>,
}

impl PostgresWarehouseAdapter {
    pub fn new(pool: Arc<Pool<PostgresConnectionManager>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<PostgresConnectionManager>> {
        self.pool.get().map_err(|e| LoadError::DatabaseError {
            code: "POOL".to_string(),
            message: e.to_string(),
            detail: None,
            hint: None,
        })
    }
}

impl WarehousePort for PostgresWarehouseAdapter {
    fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<DestinationColumn>> {
        let mut conn = self.conn()?;
        let rows = conn.query(SQL_TABLE_COLUMNS, &[&schema, &table])?;
        let columns: Vec<DestinationColumn> = rows
            .iter()
            .map(|r| DestinationColumn {
                name: r.get(0),
                sql_type: r.get(1),
            })
            .collect();
        debug!("{}.{} has {} columns", schema, table, columns.len());
        Ok(columns)
    }

    fn upsert_chunk(
        &self,
        target: &LoadTarget,
        columns: &[DestinationColumn],
        chunk: &RecordBatch,
    ) -> Result<u64> {
        let sql = build_upsert_sql(target, columns, chunk.num_rows())?;

        // Row-major, matching the $n numbering of the VALUES list.
        let mut values: Vec<Option<String>> = Vec::with_capacity(chunk.num_rows() * columns.len());
        for row in 0..chunk.num_rows() {
            for column in columns {
                let value = chunk
                    .column_by_name(&column.name)
                    .and_then(|array| cell_text(array.as_ref(), row));
                values.push(value);
            }
        }
        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();

        let mut conn = self.conn()?;
        let mut tx = conn.transaction()?;
        let written = tx.execute(sql.as_str(), &params)?;
        tx.commit()?;
        Ok(written)
    }

    fn execute_script(&self, script: &str) -> Result<u64> {
        let mut conn = self.conn()?;
        let mut tx = conn.transaction()?;
        let messages = tx.simple_query(script)?;
        tx.commit()?;

        let affected: u64 = messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(n) => *n,
                _ => 0,
            })
            .sum();
        info!("Script affected {} rows", affected);
        Ok(affected)
    }

    fn max_bind_parameters(&self) -> Option<usize> {
        Some(MAX_BIND_PARAMETERS)
    }
}
