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

//! # DDL Artifact Adapter
//!
//! Produces the hand-off files for the migration tool that owns the schema.
//! For every table it writes:
//! 1. `<schema>.<table>.sql`: `CREATE TABLE IF NOT EXISTS` matching the contract.
//! 2. `<schema>.<table>.contract.json`: the column rules, for review and audit.
//!
//! The loader never runs this DDL itself.

use crate::domain::contract::TableContract;
use crate::domain::errors::Result;
use crate::domain::kind_mapper::map_kind_to_pg_ddl;
use crate::infrastructure::postgres::sql_utils::{qualified_table, quote_ident};
use crate::ports::artifact_port::ArtifactPort;
use serde_json::json;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Renders PostgreSQL DDL for `contract` in `schema`.
pub fn render_create_table(schema: &str, contract: &TableContract) -> String {
    let mut lines: Vec<String> = contract
        .columns
        .iter()
        .map(|c| {
            let mut line = format!("    {} {}", quote_ident(&c.name), map_kind_to_pg_ddl(c.kind));
            if c.is_identity {
                line.push_str(" GENERATED BY DEFAULT AS IDENTITY");
            }
            if !c.nullable {
                line.push_str(" NOT NULL");
            }
            if let Some(default) = &c.server_default {
                line.push_str(&format!(" DEFAULT {}", default));
            }
            line
        })
        .collect();

    let key = contract
        .primary_key
        .iter()
        .map(|k| quote_ident(k))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!(
        "    CONSTRAINT {} PRIMARY KEY ({})",
        quote_ident(&format!("{}_pkey", contract.name)),
        key
    ));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
        qualified_table(schema, &contract.name),
        lines.join(",\n")
    )
}

#[derive(Debug, Default)]
pub struct DdlArtifactAdapter;

impl DdlArtifactAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_file(&self, path: &Path, content: &str) -> std::io::Result<()> {
        let mut f = File::create(path)?;
        f.write_all(content.as_bytes())?;
        Ok(())
    }

    fn describe_contract(&self, schema: &str, contract: &TableContract) -> serde_json::Value {
        let columns: Vec<serde_json::Value> = contract
            .columns
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "kind": c.kind.to_string(),
                    "nullable": c.nullable,
                    "bounds": c.bounds.map(|(low, high)| vec![low, high]),
                    "derived": c.derive.is_some(),
                    "renamed_from": c.original_name,
                    "identity": c.is_identity,
                    "server_default": c.server_default,
                })
            })
            .collect();
        json!({
            "table": format!("{}.{}", schema, contract.name),
            "primary_key": contract.primary_key,
            "constraint": format!("{}_pkey", contract.name),
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "columns": columns,
        })
    }
}

impl ArtifactPort for DdlArtifactAdapter {
    fn write_artifacts(
        &self,
        schema: &str,
        contract: &TableContract,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;
        let stem = format!("{}.{}", schema, contract.name);

        let ddl_path = output_dir.join(format!("{}.sql", stem));
        self.write_file(&ddl_path, &render_create_table(schema, contract))?;

        let contract_path = output_dir.join(format!("{}.contract.json", stem));
        let description = serde_json::to_string_pretty(&self.describe_contract(schema, contract))?;
        self.write_file(&contract_path, &description)?;

        Ok(vec![ddl_path, contract_path])
    }
}
