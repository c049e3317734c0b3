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

//! # Runtime Context
//!
//! Sets up the shared resources a run needs:
//! 1. **Thread Pool**: the global `rayon` pool that loads tables in parallel.
//! 2. **Connection Pool**: an `r2d2` pool of PostgreSQL connections, sized
//!    so every worker can hold one while a spare serves metadata lookups.

use crate::config::AppConfig;
use crate::domain::errors::{LoadError, Result};
use crate::infrastructure::postgres::connection_manager::PostgresConnectionManager;
use log::info;
use r2d2::Pool;
use std::sync::Arc;

pub struct RuntimeContext {
    /// The number of tables loaded at once.
    pub num_threads: usize,
}

impl RuntimeContext {
    /// Sizes and installs the global thread pool.
    ///
    /// `load.parallel` wins when set; otherwise `cpu_percent` (default 50%)
    /// of the available cores is used, and never fewer than one thread.
    pub fn init(config: &AppConfig) -> Self {
        let cpu_percent = config.load.cpu_percent.unwrap_or(50);
        let total_cpus = num_cpus::get();
        let num_threads = config
            .load
            .parallel
            .unwrap_or_else(|| (total_cpus as f64 * (cpu_percent as f64 / 100.0)).ceil() as usize);
        let num_threads = std::cmp::max(1, num_threads);

        info!(
            "Initializing worker pool with {} threads (Target CPU: {}%)",
            num_threads, cpu_percent
        );

        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap_or_else(|e| {
                info!("Global thread pool already initialized: {}", e);
            });

        Self { num_threads }
    }

    /// Opens the warehouse connection pool.
    pub fn connection_pool(&self, config: &AppConfig) -> Result<Arc<Pool<PostgresConnectionManager>>> {
        let db = &config.database;
        info!(
            "Initializing connection pool for {}@{}:{}/{}...",
            db.username, db.host, db.port, db.dbname
        );

        let manager = PostgresConnectionManager::new(db.to_pg_config());
        let pool = Pool::builder()
            .max_size((self.num_threads + 1) as u32)
            .build(manager)
            .map_err(|e| LoadError::DatabaseError {
                code: "POOL".to_string(),
                message: format!("Failed to create connection pool: {}", e),
                detail: None,
                hint: None,
            })?;
        Ok(Arc::new(pool))
    }
}
