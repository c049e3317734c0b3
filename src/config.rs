use crate::domain::errors::{LoadError, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: Option<String>,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    pub application_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoadConfig {
    /// Rows per insert statement, before the bind-parameter cap.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
    pub parallel: Option<usize>,
    pub cpu_percent: Option<u8>,
    #[serde(default)]
    pub tables: Vec<String>,
}

/// One entry of the SQL transform registry, run in file order.
#[derive(Debug, Deserialize, Clone)]
pub struct TransformConfig {
    pub name: String,
    /// Inline SQL. Takes precedence over `sql_file`.
    pub sql: Option<String>,
    pub sql_file: Option<String>,
    /// Tables the script writes.
    #[serde(default)]
    pub tables: Vec<String>,
    /// Tables the script reads.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn default_port() -> u16 {
    5432
}

fn default_batch_size() -> usize {
    500
}

fn default_report_dir() -> String {
    "./reports".to_string()
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            report_dir: default_report_dir(),
            parallel: None,
            cpu_percent: None,
            tables: Vec::new(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    // Overrides for ad-hoc runs
    #[arg(long, global = true)]
    pub username: Option<String>,
    #[arg(long, global = true)]
    pub password: Option<String>,
    #[arg(long, global = true)]
    pub host: Option<String>,
    #[arg(long, global = true)]
    pub port: Option<u16>,
    #[arg(long, global = true)]
    pub dbname: Option<String>,
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,
    #[arg(long, global = true)]
    pub report_dir: Option<String>,
    #[arg(long, global = true)]
    pub parallel: Option<usize>,
    #[arg(long, global = true)]
    pub cpu_percent: Option<u8>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate an input file against table contracts and upsert it
    Load {
        /// Catalog keys to load; defaults to `load.tables` from the config
        tables: Vec<String>,
        #[arg(short, long)]
        input: String,
        /// csv, csv.gz, json, parquet, pitching-boxscores or batting-boxscores
        #[arg(long)]
        format: Option<String>,
        /// Enforce and align against an in-memory warehouse; nothing is written
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the configured SQL transforms in order
    Transform {
        /// Run only these transforms (registry order is kept)
        names: Vec<String>,
    },
    /// Print or write CREATE TABLE DDL for catalog tables
    Ddl {
        tables: Vec<String>,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List the catalog
    Contracts,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Builds a config purely from command-line flags.
    pub fn default_from_cli(args: &CliArgs) -> Self {
        Self {
            database: DatabaseConfig {
                username: args.username.clone().unwrap_or_default(),
                password: args.password.clone(),
                host: args.host.clone().unwrap_or_else(|| "localhost".to_string()),
                port: args.port.unwrap_or_else(default_port),
                dbname: args.dbname.clone().unwrap_or_default(),
                application_name: None,
            },
            load: LoadConfig::default(),
            transforms: Vec::new(),
        }
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(u) = &args.username { self.database.username = u.clone(); }
        if let Some(p) = &args.password { self.database.password = Some(p.clone()); }
        if let Some(h) = &args.host { self.database.host = h.clone(); }
        if let Some(p) = args.port { self.database.port = p; }
        if let Some(d) = &args.dbname { self.database.dbname = d.clone(); }
        if let Some(b) = args.batch_size { self.load.batch_size = b; }
        if let Some(r) = &args.report_dir { self.load.report_dir = r.clone(); }
        if let Some(p) = args.parallel { self.load.parallel = Some(p); }
        if let Some(c) = args.cpu_percent { self.load.cpu_percent = Some(c); }
    }

    /// Checks the settings every command relies on.
    pub fn validate(&self) -> Result<()> {
        if self.load.batch_size == 0 {
            return Err(LoadError::ConfigError("load.batch_size must be at least 1".to_string()));
        }
        if let Some(pct) = self.load.cpu_percent {
            if pct == 0 || pct > 100 {
                return Err(LoadError::ConfigError(format!(
                    "load.cpu_percent must be between 1 and 100, got {}",
                    pct
                )));
            }
        }
        if self.load.parallel == Some(0) {
            return Err(LoadError::ConfigError("load.parallel must be at least 1".to_string()));
        }
        for (idx, transform) in self.transforms.iter().enumerate() {
            if transform.sql.is_none() && transform.sql_file.is_none() {
                return Err(LoadError::ConfigError(format!(
                    "transform '{}' has neither sql nor sql_file",
                    transform.name
                )));
            }
            if self.transforms[..idx].iter().any(|t| t.name == transform.name) {
                return Err(LoadError::ConfigError(format!(
                    "transform '{}' is defined twice",
                    transform.name
                )));
            }
        }
        Ok(())
    }

    /// Checks the connection settings; only needed by commands that touch the database.
    pub fn validate_database(&self) -> Result<()> {
        let db = &self.database;
        for (field, value) in [("host", &db.host), ("username", &db.username), ("dbname", &db.dbname)] {
            if value.trim().is_empty() {
                return Err(LoadError::ConfigError(format!("database.{} is required", field)));
            }
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// The configured password, falling back to `PGPASSWORD`.
    pub fn resolve_password(&self) -> Option<String> {
        self.password
            .clone()
            .or_else(|| std::env::var("PGPASSWORD").ok())
    }

    pub fn to_pg_config(&self) -> postgres::Config {
        let mut pg = postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .user(&self.username)
            .dbname(&self.dbname)
            .application_name(self.application_name.as_deref().unwrap_or("diamond_etl"));
        if let Some(password) = self.resolve_password() {
            pg.password(password);
        }
        pg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_yaml_config() {
        let yaml = r#"
database:
  username: "etl"
  password: "secret"
  host: "localhost"
  dbname: "baseball"
load:
  batch_size: 250
  tables: ["statcast_pitches"]
transforms:
  - name: fact_pitch
    sql: "INSERT INTO production.fact_pitch SELECT 1"
    tables: ["production.fact_pitch"]
    depends_on: ["staging.statcast_pitches"]
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{}", yaml).unwrap();
        let path = file.path().to_str().unwrap();

        let config = AppConfig::from_file(path).expect("Failed to parse config");

        assert_eq!(config.database.port, 5432);
        assert_eq!(config.load.batch_size, 250);
        assert_eq!(config.load.report_dir, "./reports");
        assert_eq!(config.transforms[0].depends_on, vec!["staging.statcast_pitches"]);
        assert!(config.validate().is_ok());
        assert!(config.validate_database().is_ok());
    }

    #[test]
    fn test_load_json_config_with_defaults() {
        let json = r#"{"database": {"username": "etl", "host": "db", "dbname": "baseball"}}"#;
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", json).unwrap();

        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.load.batch_size, 500);
        assert!(config.transforms.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let args = CliArgs::parse_from(["diamond_etl", "contracts"]);
        let mut config = AppConfig::default_from_cli(&args);
        assert!(config.validate().is_ok());
        assert!(config.validate_database().is_err());

        config.load.cpu_percent = Some(150);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_apply() {
        let args = CliArgs::parse_from([
            "diamond_etl",
            "load",
            "statcast_pitches",
            "--input",
            "pitches.csv",
            "--batch-size",
            "100",
            "--host",
            "warehouse",
        ]);
        let mut config = AppConfig::default_from_cli(&args);
        config.merge_cli(&args);
        assert_eq!(config.load.batch_size, 100);
        assert_eq!(config.database.host, "warehouse");
        assert!(matches!(args.command, Command::Load { ref tables, .. } if tables == &["statcast_pitches"]));
    }
}
