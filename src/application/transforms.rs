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

//! # SQL Transform Registry
//!
//! Staging-to-production transforms are plain SQL scripts run inside the
//! warehouse. The registry runs them in declaration order, each in its own
//! transaction, and stops at the first failure. Before anything runs it
//! checks that every table a script reads is either produced by an earlier
//! entry or not produced by the registry at all.

use crate::config::TransformConfig;
use crate::domain::errors::{LoadError, Result};
use crate::ports::warehouse_port::WarehousePort;
use log::{error, info};
use std::time::Instant;

/// A resolved registry entry.
#[derive(Debug, Clone)]
pub struct TransformStep {
    pub name: String,
    pub script: String,
    pub tables: Vec<String>,
    pub depends_on: Vec<String>,
}

impl TransformStep {
    /// Loads the entry's SQL, reading `sql_file` when no inline SQL is given.
    pub fn from_config(config: &TransformConfig) -> Result<Self> {
        let script = match (&config.sql, &config.sql_file) {
            (Some(sql), _) => sql.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => {
                return Err(LoadError::ConfigError(format!(
                    "transform '{}' has neither sql nor sql_file",
                    config.name
                )))
            }
        };
        Ok(Self {
            name: config.name.clone(),
            script,
            tables: config.tables.clone(),
            depends_on: config.depends_on.clone(),
        })
    }
}

/// `(name, rows affected)` in run order.
pub type TransformResults = Vec<(String, u64)>;

pub struct TransformRegistry {
    steps: Vec<TransformStep>,
}

impl TransformRegistry {
    pub fn new(steps: Vec<TransformStep>) -> Self {
        Self { steps }
    }

    pub fn from_config(configs: &[TransformConfig]) -> Result<Self> {
        let steps = configs
            .iter()
            .map(TransformStep::from_config)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(steps))
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Fails when a step reads a table that a later step produces.
    pub fn validate_order(&self) -> Result<()> {
        for (idx, step) in self.steps.iter().enumerate() {
            for dep in &step.depends_on {
                let producer = self.steps.iter().position(|s| s.tables.contains(dep));
                if let Some(p) = producer {
                    if p >= idx {
                        return Err(LoadError::ConfigError(format!(
                            "transform '{}' depends on '{}', which is produced by '{}' at or after it",
                            step.name, dep, self.steps[p].name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Runs the steps (all, or only those named in `only`) in registry order.
    pub fn run(&self, port: &dyn WarehousePort, only: &[String]) -> Result<TransformResults> {
        self.validate_order()?;

        for name in only {
            if !self.steps.iter().any(|s| &s.name == name) {
                return Err(LoadError::ConfigError(format!(
                    "unknown transform '{}' (options: {})",
                    name,
                    self.names().join(", ")
                )));
            }
        }

        let mut results = TransformResults::new();
        for step in self
            .steps
            .iter()
            .filter(|s| only.is_empty() || only.contains(&s.name))
        {
            let start = Instant::now();
            info!("Running transform '{}'", step.name);
            match port.execute_script(&step.script) {
                Ok(rows) => {
                    info!(
                        "Transform '{}' affected {} rows in {:.2}s",
                        step.name,
                        rows,
                        start.elapsed().as_secs_f64()
                    );
                    results.push((step.name.clone(), rows));
                }
                Err(e) => {
                    error!("Transform '{}' failed, aborting run: {}", step.name, e);
                    return Err(LoadError::TransformFailed {
                        name: step.name.clone(),
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(results)
    }
}
