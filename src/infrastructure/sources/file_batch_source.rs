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

//! # File Batch Source
//!
//! Reads a whole input file into one batch. CSV (plain or gzip) and JSON
//! records come in as nullable text columns and are typed later by the
//! contracts; Parquet keeps the types stored in the file. Box score payload
//! files are flattened into pitching or batting lines.

use crate::builders::boxscores::{flatten_boxscores, BoxscoreKind, BoxscorePayload};
use crate::domain::errors::{LoadError, Result};
use crate::engine::batch::{readable_columns, text_batch};
use crate::ports::batch_source::BatchSource;
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use flate2::read::GzDecoder;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Rows per batch pulled from the Parquet reader before concatenation.
const PARQUET_READ_BATCH_ROWS: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    CsvGz,
    Json,
    Parquet,
    Boxscores(BoxscoreKind),
}

impl SourceFormat {
    /// Infers the format from the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".csv.gz") {
            Ok(SourceFormat::CsvGz)
        } else if name.ends_with(".csv") {
            Ok(SourceFormat::Csv)
        } else if name.ends_with(".json") {
            Ok(SourceFormat::Json)
        } else if name.ends_with(".parquet") {
            Ok(SourceFormat::Parquet)
        } else {
            Err(LoadError::ConfigError(format!(
                "cannot infer input format of '{}'; expected .csv, .csv.gz, .json or .parquet",
                path.display()
            )))
        }
    }

    /// Parses a `--format` value.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "csv.gz" | "csv-gz" => Ok(SourceFormat::CsvGz),
            "json" => Ok(SourceFormat::Json),
            "parquet" => Ok(SourceFormat::Parquet),
            "pitching-boxscores" => Ok(SourceFormat::Boxscores(BoxscoreKind::Pitching)),
            "batting-boxscores" => Ok(SourceFormat::Boxscores(BoxscoreKind::Batting)),
            other => Err(LoadError::ConfigError(format!("unknown input format '{}'", other))),
        }
    }
}

pub struct FileBatchSource {
    path: PathBuf,
    format: SourceFormat,
}

impl FileBatchSource {
    pub fn new(path: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = SourceFormat::from_path(&path)?;
        Ok(Self::new(path, format))
    }

    fn open(&self) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(&self.path)?))
    }

    fn read_csv<R: Read>(&self, reader: R) -> Result<RecordBatch> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let names: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        let mut rows = 0;
        for record in csv_reader.records() {
            let record = record?;
            for (idx, column) in columns.iter_mut().enumerate() {
                let value = record.get(idx).filter(|v| !v.is_empty()).map(str::to_string);
                column.push(value);
            }
            rows += 1;
        }
        text_batch(&names, columns, rows)
    }

    fn read_json(&self) -> Result<RecordBatch> {
        let parsed: Value = serde_json::from_reader(self.open()?)?;
        let records = parsed.as_array().ok_or_else(|| {
            LoadError::ConfigError(format!(
                "{} must contain a JSON array of records",
                self.path.display()
            ))
        })?;

        let mut names: Vec<String> = Vec::new();
        for record in records.iter().filter_map(Value::as_object) {
            for key in record.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .iter()
            .map(|name| {
                records
                    .iter()
                    .map(|r| json_text(r.get(name)))
                    .collect::<Vec<_>>()
            })
            .collect();
        text_batch(&names, columns, records.len())
    }

    fn read_parquet(&self) -> Result<RecordBatch> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&self.path)?)?
            .with_batch_size(PARQUET_READ_BATCH_ROWS);
        let schema = builder.schema().clone();
        let batches = builder
            .build()?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let batch = concat_batches(&schema, &batches)?;
        // Categorical (dictionary) and decimal columns are decoded to plain types.
        readable_columns(&batch)
    }

    fn read_boxscores(&self, kind: BoxscoreKind) -> Result<RecordBatch> {
        let payloads: Vec<BoxscorePayload> = serde_json::from_reader(self.open()?)?;
        flatten_boxscores(&payloads, kind)
    }
}

fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl BatchSource for FileBatchSource {
    fn read_batch(&self) -> Result<RecordBatch> {
        let batch = match self.format {
            SourceFormat::Csv => self.read_csv(self.open()?)?,
            SourceFormat::CsvGz => self.read_csv(GzDecoder::new(self.open()?))?,
            SourceFormat::Json => self.read_json()?,
            SourceFormat::Parquet => self.read_parquet()?,
            SourceFormat::Boxscores(kind) => self.read_boxscores(kind)?,
        };
        info!(
            "Read {} rows x {} columns from {}",
            batch.num_rows(),
            batch.num_columns(),
            self.describe()
        );
        Ok(batch)
    }

    fn describe(&self) -> String {
        format!("{} ({:?})", self.path.display(), self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::batch::{cell, text_values, Cell};
    use arrow::array::{ArrayRef, DictionaryArray, Int64Array};
    use arrow::datatypes::{DataType, Int32Type};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use parquet::arrow::ArrowWriter;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_csv_reads_as_text_with_empty_cells_null() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pitches.csv");
        std::fs::write(&path, "game_pk,pitch_type\n745001,FF\n745001,\n").unwrap();

        let batch = FileBatchSource::from_path(&path).unwrap().read_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        let pitch_type = text_values(batch.column_by_name("pitch_type").unwrap().as_ref());
        assert_eq!(pitch_type, vec![Some("FF".to_string()), None]);
    }

    #[test]
    fn test_gzipped_csv_is_decompressed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pitches.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"game_pk\n1\n2\n3\n").unwrap();
        encoder.finish().unwrap();

        let source = FileBatchSource::from_path(&path).unwrap();
        assert_eq!(source.read_batch().unwrap().num_rows(), 3);
    }

    #[test]
    fn test_json_records_union_their_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.json");
        std::fs::write(&path, r#"[{"player_id": 1, "active": true}, {"player_id": 2, "full_name": "A"}]"#)
            .unwrap();

        let batch = FileBatchSource::from_path(&path).unwrap().read_batch().unwrap();
        assert_eq!(batch.num_columns(), 3);
        let active = text_values(batch.column_by_name("active").unwrap().as_ref());
        assert_eq!(active, vec![Some("true".to_string()), None]);
    }

    #[test]
    fn test_parquet_reads_every_batch_and_decodes_dictionaries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pitches.parquet");
        let rows = PARQUET_READ_BATCH_ROWS + 10;
        let game_pk = Int64Array::from_iter_values(0..rows as i64);
        let description: DictionaryArray<Int32Type> = (0..rows)
            .map(|i| if i % 2 == 0 { "ball" } else { "foul" })
            .collect();
        let batch = RecordBatch::try_from_iter(vec![
            ("game_pk", Arc::new(game_pk) as ArrayRef),
            ("description", Arc::new(description) as ArrayRef),
        ])
        .unwrap();

        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch.slice(0, 100)).unwrap();
        writer.write(&batch.slice(100, rows - 100)).unwrap();
        writer.close().unwrap();

        let out = FileBatchSource::from_path(&path).unwrap().read_batch().unwrap();
        assert_eq!(out.num_rows(), rows);
        assert_eq!(
            out.schema().field_with_name("description").unwrap().data_type(),
            &DataType::Utf8
        );
        let description = text_values(out.column_by_name("description").unwrap().as_ref());
        assert_eq!(description[0].as_deref(), Some("ball"));
        assert_eq!(description[rows - 1].as_deref(), Some("foul"));
        let game_pk = out.column_by_name("game_pk").unwrap();
        assert_eq!(cell(game_pk.as_ref(), rows - 1), Cell::Int(rows as i64 - 1));
    }

    #[test]
    fn test_unknown_extension_is_a_config_error() {
        let err = FileBatchSource::from_path("input.xlsx").err().unwrap();
        assert!(matches!(err, LoadError::ConfigError(_)));
        assert!(SourceFormat::parse("pitching-boxscores").is_ok());
    }
}
