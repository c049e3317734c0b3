//! # Diamond ETL
//!
//! Command-line entry point: loads Statcast and box score files into the
//! warehouse through the table contracts, runs the SQL transforms, and
//! renders DDL for the migration tool.

use diamond_etl::application::orchestrator::{dry_run_warehouse, LoadOrchestrator};
use diamond_etl::application::runtime::RuntimeContext;
use diamond_etl::application::transforms::TransformRegistry;
use diamond_etl::config::{AppConfig, CliArgs, Command};
use diamond_etl::contracts::Catalog;
use diamond_etl::domain::errors::{LoadError, Result};
use diamond_etl::infrastructure::artifacts::ddl_artifact_adapter::{render_create_table, DdlArtifactAdapter};
use diamond_etl::infrastructure::postgres::postgres_warehouse_adapter::PostgresWarehouseAdapter;
use diamond_etl::infrastructure::sources::file_batch_source::{FileBatchSource, SourceFormat};
use diamond_etl::ports::artifact_port::ArtifactPort;
use diamond_etl::ports::warehouse_port::WarehousePort;
use clap::Parser;
use log::{error, info};
use std::path::Path;
use std::process;
use std::sync::Arc;

fn main() {
    // 1. Initialize Logging
    env_logger::init();

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Load Config
    let mut config = if let Some(config_path) = &args.config {
        match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        }
    } else {
        AppConfig::default_from_cli(&args)
    };

    // Merge CLI overrides
    config.merge_cli(&args);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    let catalog = match Catalog::standard() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid table catalog: {}", e);
            process::exit(1);
        }
    };

    // 4. Dispatch
    let outcome = match &args.command {
        Command::Load {
            tables,
            input,
            format,
            dry_run,
        } => run_load(&config, catalog, tables, input, format.as_deref(), *dry_run),
        Command::Transform { names } => run_transforms(&config, names),
        Command::Ddl { tables, output } => run_ddl(&catalog, tables, output.as_deref()),
        Command::Contracts => {
            list_contracts(&catalog);
            Ok(0)
        }
    };

    match outcome {
        Ok(0) => {}
        Ok(failed) => {
            error!("{} table(s) failed; see the run report for details", failed);
            process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

/// Returns the number of tables that failed to load.
fn run_load(
    config: &AppConfig,
    catalog: Catalog,
    tables: &[String],
    input: &str,
    format: Option<&str>,
    dry_run: bool,
) -> Result<usize> {
    let keys: Vec<String> = if tables.is_empty() {
        config.load.tables.clone()
    } else {
        tables.to_vec()
    };
    if keys.is_empty() {
        return Err(LoadError::ConfigError(
            "no tables given on the command line or in load.tables".to_string(),
        ));
    }

    let source = match format {
        Some(f) => FileBatchSource::new(input, SourceFormat::parse(f)?),
        None => FileBatchSource::from_path(input)?,
    };

    let runtime = RuntimeContext::init(config);
    let warehouse: Arc<dyn WarehousePort> = if dry_run {
        info!("Dry run: loading into an in-memory warehouse");
        Arc::new(dry_run_warehouse(&catalog))
    } else {
        config.validate_database()?;
        Arc::new(PostgresWarehouseAdapter::new(runtime.connection_pool(config)?))
    };

    let orchestrator = LoadOrchestrator::new(warehouse, catalog, &config.load);
    let results = orchestrator.run(&keys, &source)?;

    let success_count = results.iter().filter(|r| r.is_success()).count();
    info!(
        "Load finished. {}/{} tables successful.",
        success_count,
        results.len()
    );
    Ok(results.len() - success_count)
}

fn run_transforms(config: &AppConfig, names: &[String]) -> Result<usize> {
    let registry = TransformRegistry::from_config(&config.transforms)?;
    if registry.names().is_empty() {
        info!("No transforms configured.");
        return Ok(0);
    }
    registry.validate_order()?;
    config.validate_database()?;

    let runtime = RuntimeContext::init(config);
    let warehouse = PostgresWarehouseAdapter::new(runtime.connection_pool(config)?);
    for (name, rows) in registry.run(&warehouse, names)? {
        info!("{:<32} {} rows", name, rows);
    }
    Ok(0)
}

fn run_ddl(catalog: &Catalog, tables: &[String], output: Option<&str>) -> Result<usize> {
    let registrations = if tables.is_empty() {
        catalog.registrations().iter().collect::<Vec<_>>()
    } else {
        tables
            .iter()
            .map(|t| catalog.get(t))
            .collect::<Result<Vec<_>>>()?
    };

    let adapter = DdlArtifactAdapter::new();
    for registration in registrations {
        match output {
            Some(dir) => {
                let paths =
                    adapter.write_artifacts(&registration.schema, &registration.contract, Path::new(dir))?;
                info!("Wrote {:?}", paths);
            }
            None => println!("{}", render_create_table(&registration.schema, &registration.contract)),
        }
    }
    Ok(0)
}

fn list_contracts(catalog: &Catalog) {
    for registration in catalog.registrations() {
        println!(
            "{:<24} {}.{:<24} key ({}) {} columns{}",
            registration.key,
            registration.schema,
            registration.table,
            registration.contract.primary_key.join(", "),
            registration.contract.columns.len(),
            if registration.builder.is_some() { ", built" } else { "" }
        );
    }
}
