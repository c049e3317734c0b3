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

//! # Batch Helpers
//!
//! A batch is an Arrow `RecordBatch`. Record batches are immutable, so every
//! "mutation" here returns a new batch that shares the untouched column
//! buffers with the old one.
//!
//! Cells are read through `Cell`, a small type-erased view that lets the
//! coercion, rule and dedupe code stay independent of the physical Arrow
//! type a source happened to produce.

use crate::domain::errors::Result;
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, LargeStringArray, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::compute::{can_cast_types, cast, nullif, take};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
pub const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A single value read out of any supported Arrow array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'a str),
    /// Days since the Unix epoch.
    Date(i32),
    /// Microseconds since the Unix epoch, UTC.
    Timestamp(i64),
}

macro_rules! downcast_value {
    ($array:expr, $ty:ty, $row:expr) => {
        $array.as_any().downcast_ref::<$ty>().map(|a| a.value($row))
    };
}

/// Reads row `row` of `array`. Unsupported physical types read as `Null`.
pub fn cell(array: &dyn Array, row: usize) -> Cell<'_> {
    if array.is_null(row) {
        return Cell::Null;
    }
    let value = match array.data_type() {
        DataType::Int8 => downcast_value!(array, Int8Array, row).map(|v| Cell::Int(v as i64)),
        DataType::Int16 => downcast_value!(array, Int16Array, row).map(|v| Cell::Int(v as i64)),
        DataType::Int32 => downcast_value!(array, Int32Array, row).map(|v| Cell::Int(v as i64)),
        DataType::Int64 => downcast_value!(array, Int64Array, row).map(Cell::Int),
        DataType::UInt8 => downcast_value!(array, UInt8Array, row).map(|v| Cell::Int(v as i64)),
        DataType::UInt16 => downcast_value!(array, UInt16Array, row).map(|v| Cell::Int(v as i64)),
        DataType::UInt32 => downcast_value!(array, UInt32Array, row).map(|v| Cell::Int(v as i64)),
        DataType::UInt64 => downcast_value!(array, UInt64Array, row).map(|v| {
            i64::try_from(v)
                .map(Cell::Int)
                .unwrap_or(Cell::Float(v as f64))
        }),
        DataType::Float32 => {
            downcast_value!(array, Float32Array, row).map(|v| Cell::Float(v as f64))
        }
        DataType::Float64 => downcast_value!(array, Float64Array, row).map(Cell::Float),
        DataType::Boolean => downcast_value!(array, BooleanArray, row).map(Cell::Bool),
        DataType::Utf8 => downcast_value!(array, StringArray, row).map(Cell::Text),
        DataType::LargeUtf8 => downcast_value!(array, LargeStringArray, row).map(Cell::Text),
        DataType::Date32 => downcast_value!(array, Date32Array, row).map(Cell::Date),
        DataType::Date64 => downcast_value!(array, Date64Array, row)
            .map(|ms| Cell::Date(ms.div_euclid(86_400_000) as i32)),
        DataType::Timestamp(TimeUnit::Second, _) => {
            downcast_value!(array, TimestampSecondArray, row)
                .map(|v| Cell::Timestamp(v.saturating_mul(1_000_000)))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            downcast_value!(array, TimestampMillisecondArray, row)
                .map(|v| Cell::Timestamp(v.saturating_mul(1_000)))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            downcast_value!(array, TimestampMicrosecondArray, row).map(Cell::Timestamp)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            downcast_value!(array, TimestampNanosecondArray, row)
                .map(|v| Cell::Timestamp(v.div_euclid(1_000)))
        }
        _ => None,
    };
    value.unwrap_or(Cell::Null)
}

/// Whether `cell` can read values of this type directly.
pub fn is_readable(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Null
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
            | DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Date32
            | DataType::Date64
            | DataType::Timestamp(_, _)
    )
}

/// Casts an array `cell` cannot read into one it can.
///
/// Dictionaries become their value type, decimals and half floats become
/// `Float64`, and anything else with a cast to text becomes `Utf8`. Arrays
/// with no usable cast are returned unchanged.
pub fn readable_array(array: &ArrayRef) -> Result<ArrayRef> {
    let target = match array.data_type() {
        dt if is_readable(dt) => return Ok(array.clone()),
        DataType::Dictionary(_, value) => value.as_ref().clone(),
        DataType::Decimal128(_, _) | DataType::Decimal256(_, _) | DataType::Float16 => {
            DataType::Float64
        }
        dt if can_cast_types(dt, &DataType::Utf8) => DataType::Utf8,
        _ => return Ok(array.clone()),
    };
    let casted = cast(array.as_ref(), &target)?;
    // Dictionary values may need a second pass (e.g. a dictionary of decimals).
    readable_array(&casted)
}

/// Applies `readable_array` to every column.
pub fn readable_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    if schema.fields().iter().all(|f| is_readable(f.data_type())) {
        return Ok(batch.clone());
    }
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let array = readable_array(column)?;
        fields.push(
            field
                .as_ref()
                .clone()
                .with_data_type(array.data_type().clone())
                .with_nullable(true),
        );
        columns.push(array);
    }
    assemble(batch.num_rows(), fields, columns)
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub fn micros_to_datetime(micros: i64) -> Option<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Canonical text rendering of a cell, as handed to the database.
pub fn cell_text(array: &dyn Array, row: usize) -> Option<String> {
    match cell(array, row) {
        Cell::Null => None,
        Cell::Int(v) => Some(v.to_string()),
        Cell::Float(v) if v.is_finite() => Some(v.to_string()),
        Cell::Float(_) => None,
        Cell::Bool(v) => Some(v.to_string()),
        Cell::Text(s) => Some(s.to_string()),
        Cell::Date(d) => days_to_date(d).map(|d| d.format("%Y-%m-%d").to_string()),
        Cell::Timestamp(us) => {
            micros_to_datetime(us).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
        }
    }
}

/// Numeric view of a column, the way a lenient `to_numeric` would read it.
pub fn numeric_values(array: &dyn Array) -> Vec<Option<f64>> {
    (0..array.len())
        .map(|row| match cell(array, row) {
            Cell::Int(v) => Some(v as f64),
            Cell::Float(v) if !v.is_nan() => Some(v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        })
        .collect()
}

/// Text view of a column; non-text cells are rendered, nulls stay `None`.
pub fn text_values(array: &dyn Array) -> Vec<Option<String>> {
    (0..array.len()).map(|row| cell_text(array, row)).collect()
}

/// Boolean view of a column; anything that is not a boolean reads as `None`.
pub fn bool_values(array: &dyn Array) -> Vec<Option<bool>> {
    (0..array.len())
        .map(|row| match cell(array, row) {
            Cell::Bool(v) => Some(v),
            Cell::Int(v) => Some(v != 0),
            _ => None,
        })
        .collect()
}

pub fn has_column(batch: &RecordBatch, name: &str) -> bool {
    batch.schema().index_of(name).is_ok()
}

pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

/// Numeric view of a named column, or `None` when the column is absent.
pub fn float_column(batch: &RecordBatch, name: &str) -> Option<Vec<Option<f64>>> {
    batch.column_by_name(name).map(|c| numeric_values(c.as_ref()))
}

/// Assembles a batch, keeping the row count even when no columns remain.
pub fn assemble(rows: usize, fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(fields));
    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Replaces the named column, or appends it when it does not exist yet.
pub fn with_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch> {
    let field = Field::new(name, array.data_type().clone(), true);
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    match schema.index_of(name) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }
    assemble(batch.num_rows(), fields, columns)
}

/// Renames columns `(from, to)`. Pairs whose source is absent are ignored.
pub fn rename_columns(batch: &RecordBatch, renames: &[(String, String)]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| {
            match renames.iter().find(|(from, _)| from == f.name()) {
                Some((_, to)) => f.as_ref().clone().with_name(to.clone()).with_nullable(true),
                None => f.as_ref().clone(),
            }
        })
        .collect();
    assemble(batch.num_rows(), fields, batch.columns().to_vec())
}

/// Keeps only the rows at `indices`, in that order.
pub fn select_rows(batch: &RecordBatch, indices: &[usize]) -> Result<RecordBatch> {
    let idx: UInt32Array = indices.iter().map(|&i| i as u32).collect();
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &idx, None))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let schema = batch.schema();
    let fields = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    assemble(indices.len(), fields, columns)
}

/// Returns a copy of `array` with every cell flagged in `mask` set to null.
pub fn null_where(array: &ArrayRef, mask: &[bool]) -> Result<ArrayRef> {
    if !mask.iter().any(|m| *m) {
        return Ok(array.clone());
    }
    let mask = BooleanArray::from(mask.to_vec());
    Ok(nullif(array.as_ref(), &mask)?)
}

/// Nulls the flagged rows in each of the named columns that exist.
pub fn null_cells(batch: &RecordBatch, columns: &[&str], mask: &[bool]) -> Result<RecordBatch> {
    let mut out = batch.clone();
    for name in columns {
        if let Some(array) = out.column_by_name(name).cloned() {
            let nulled = null_where(&array, mask)?;
            out = with_column(&out, name, nulled)?;
        }
    }
    Ok(out)
}

/// Number of null cells, counting NaN floats as null.
pub fn null_count(array: &dyn Array) -> usize {
    (0..array.len())
        .filter(|&row| matches!(cell(array, row), Cell::Null) || is_nan(array, row))
        .count()
}

fn is_nan(array: &dyn Array, row: usize) -> bool {
    matches!(cell(array, row), Cell::Float(v) if v.is_nan())
}

/// A hashable, totally ordered cell used for key grouping and tie-break sorts.
///
/// Integral floats are normalised to `Int`, so an `Int` and a `Float` are
/// never equal and the manual `Eq`/`Hash`/`Ord` impls stay consistent.
#[derive(Debug, Clone)]
pub enum KeyValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl KeyValue {
    fn from_cell(cell: Cell<'_>) -> Option<Self> {
        match cell {
            Cell::Null => None,
            Cell::Int(v) => Some(KeyValue::Int(v)),
            Cell::Float(v) if v.is_nan() => None,
            Cell::Float(v) => {
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    Some(KeyValue::Int(v as i64))
                } else {
                    Some(KeyValue::Float(v))
                }
            }
            Cell::Bool(v) => Some(KeyValue::Bool(v)),
            Cell::Text(s) => Some(KeyValue::Text(s.to_string())),
            Cell::Date(d) => Some(KeyValue::Int(d as i64)),
            Cell::Timestamp(us) => Some(KeyValue::Int(us)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyValue::Int(_) | KeyValue::Float(_) => 0,
            KeyValue::Bool(_) => 1,
            KeyValue::Text(_) => 2,
        }
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            KeyValue::Int(v) => (0u8, *v).hash(state),
            KeyValue::Float(v) => (1u8, v.to_bits()).hash(state),
            KeyValue::Bool(v) => (2u8, *v).hash(state),
            KeyValue::Text(v) => (3u8, v).hash(state),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Int(a), KeyValue::Int(b)) => a.cmp(b),
            (KeyValue::Float(a), KeyValue::Float(b)) => a.total_cmp(b),
            (KeyValue::Int(a), KeyValue::Float(b)) => (*a as f64).total_cmp(b),
            (KeyValue::Float(a), KeyValue::Int(b)) => a.total_cmp(&(*b as f64)),
            (KeyValue::Bool(a), KeyValue::Bool(b)) => a.cmp(b),
            (KeyValue::Text(a), KeyValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{}", v),
            KeyValue::Float(v) => write!(f, "{}", v),
            KeyValue::Bool(v) => write!(f, "{}", v),
            KeyValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Key view of a column.
pub fn key_values(array: &dyn Array) -> Vec<Option<KeyValue>> {
    (0..array.len())
        .map(|row| KeyValue::from_cell(cell(array, row)))
        .collect()
}

/// Row-wise key tuples over the named columns (which must all exist).
pub fn key_tuples(batch: &RecordBatch, columns: &[String]) -> Vec<Vec<Option<KeyValue>>> {
    let views: Vec<Vec<Option<KeyValue>>> = columns
        .iter()
        .filter_map(|c| batch.column_by_name(c))
        .map(|c| key_values(c.as_ref()))
        .collect();
    (0..batch.num_rows())
        .map(|row| views.iter().map(|v| v[row].clone()).collect())
        .collect()
}

/// Renders a key tuple as `(100, 3, null)`.
pub fn format_key(key: &[Option<KeyValue>]) -> String {
    let parts: Vec<String> = key
        .iter()
        .map(|v| match v {
            Some(v) => v.to_string(),
            None => "null".to_string(),
        })
        .collect();
    format!("({})", parts.join(", "))
}

/// Compares two optional keys with nulls sorting last.
pub fn cmp_nulls_last(a: &Option<KeyValue>, b: &Option<KeyValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Builds a batch of nullable text columns, the shape every untyped source produces.
pub fn text_batch(names: &[String], columns: Vec<Vec<Option<String>>>, rows: usize) -> Result<RecordBatch> {
    let fields = names
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    let arrays = columns
        .into_iter()
        .map(|values| Arc::new(StringArray::from(values)) as ArrayRef)
        .collect();
    assemble(rows, fields, arrays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Decimal128Array, DictionaryArray};
    use arrow::datatypes::Int32Type;

    fn sample() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            ("a", Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])) as ArrayRef),
            (
                "b",
                Arc::new(StringArray::from(vec![Some("x"), Some("2.5"), None])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_cell_reads_across_types() {
        let batch = sample();
        assert_eq!(cell(batch.column(0).as_ref(), 0), Cell::Int(1));
        assert_eq!(cell(batch.column(0).as_ref(), 1), Cell::Null);
        assert_eq!(cell(batch.column(1).as_ref(), 1), Cell::Text("2.5"));
    }

    #[test]
    fn test_numeric_values_are_lenient() {
        let batch = sample();
        assert_eq!(
            numeric_values(batch.column(1).as_ref()),
            vec![None, Some(2.5), None]
        );
    }

    #[test]
    fn test_with_column_replaces_and_appends() {
        let batch = sample();
        let replaced = with_column(
            &batch,
            "a",
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])),
        )
        .unwrap();
        assert_eq!(replaced.schema().field(0).data_type(), &DataType::Float64);
        assert_eq!(replaced.num_columns(), 2);

        let appended = with_column(&batch, "c", Arc::new(BooleanArray::from(vec![true; 3]))).unwrap();
        assert_eq!(column_names(&appended), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_null_cells_only_touches_flagged_rows() {
        let batch = sample();
        let out = null_cells(&batch, &["a", "missing"], &[true, false, false]).unwrap();
        let a = out.column_by_name("a").unwrap();
        assert!(a.is_null(0));
        assert_eq!(cell(a.as_ref(), 2), Cell::Int(3));
    }

    #[test]
    fn test_select_rows_reorders() {
        let batch = sample();
        let out = select_rows(&batch, &[2, 0]).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert_eq!(cell(out.column(0).as_ref(), 0), Cell::Int(3));
        assert_eq!(cell(out.column(0).as_ref(), 1), Cell::Int(1));
    }

    #[test]
    fn test_key_values_normalise_integral_floats() {
        let floats = Float64Array::from(vec![Some(5.0), Some(5.5), None]);
        let keys = key_values(&floats);
        assert_eq!(keys[0], Some(KeyValue::Int(5)));
        assert_eq!(keys[1], Some(KeyValue::Float(5.5)));
        assert_eq!(keys[2], None);
        assert_eq!(format_key(&keys), "(5, 5.5, null)");
    }

    #[test]
    fn test_dictionary_and_decimal_columns_become_readable() {
        let description: DictionaryArray<Int32Type> =
            vec![Some("hit_into_play"), None, Some("ball")].into_iter().collect();
        let plate_x = Decimal128Array::from(vec![Some(125), Some(-50), None])
            .with_precision_and_scale(5, 2)
            .unwrap();
        let batch = RecordBatch::try_from_iter(vec![
            ("description", Arc::new(description) as ArrayRef),
            ("plate_x", Arc::new(plate_x) as ArrayRef),
            ("pitch_number", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
        ])
        .unwrap();
        assert_eq!(cell(batch.column(0).as_ref(), 0), Cell::Null);

        let out = readable_columns(&batch).unwrap();
        assert_eq!(out.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(
            text_values(out.column(0).as_ref()),
            vec![Some("hit_into_play".to_string()), None, Some("ball".to_string())]
        );
        assert_eq!(numeric_values(out.column(1).as_ref()), vec![Some(1.25), Some(-0.5), None]);
        assert_eq!(out.column(2).as_ref(), batch.column(2).as_ref());
    }

    #[test]
    fn test_readable_batch_is_returned_as_is() {
        let batch = sample();
        assert_eq!(readable_columns(&batch).unwrap(), batch);
    }

    #[test]
    fn test_cell_text_renders_dates_and_timestamps() {
        let dates = Date32Array::from(vec![date_to_days(NaiveDate::from_ymd_opt(2025, 3, 18).unwrap())]);
        assert_eq!(cell_text(&dates, 0).as_deref(), Some("2025-03-18"));

        let ts = TimestampMicrosecondArray::from(vec![1_742_256_000_000_000]).with_timezone("UTC");
        assert_eq!(cell_text(&ts, 0).as_deref(), Some("2025-03-18T00:00:00.000000Z"));
    }
}
