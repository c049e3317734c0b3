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

//! # Kind Coercion
//!
//! One `match` arm per `ColumnKind`. A cell that cannot be converted becomes
//! null; coercion itself never fails.

use crate::domain::contract::ColumnKind;
use crate::domain::errors::Result;
use crate::domain::kind_mapper::TIMESTAMP_TZ;
use crate::engine::batch::{self, cell, date_to_days, null_where, numeric_values, Cell};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int16Array, Int64Array,
    StringArray, TimestampMicrosecondArray,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::sync::Arc;

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Converts `array` to the Arrow representation of `kind`.
pub fn coerce(array: &dyn Array, kind: ColumnKind) -> ArrayRef {
    let rows = 0..array.len();
    match kind {
        ColumnKind::Int64 => Arc::new(
            rows.map(|r| to_i64(cell(array, r)))
                .collect::<Int64Array>(),
        ),
        ColumnKind::Int16 => Arc::new(
            rows.map(|r| to_i64(cell(array, r)).and_then(|v| i16::try_from(v).ok()))
                .collect::<Int16Array>(),
        ),
        ColumnKind::Float64 => Arc::new(
            rows.map(|r| to_f64(cell(array, r)))
                .collect::<Float64Array>(),
        ),
        ColumnKind::Boolean => Arc::new(
            rows.map(|r| to_bool(cell(array, r)))
                .collect::<BooleanArray>(),
        ),
        ColumnKind::Date => Arc::new(
            rows.map(|r| to_date(cell(array, r)))
                .collect::<Date32Array>(),
        ),
        ColumnKind::Timestamp => Arc::new(
            rows.map(|r| to_timestamp(cell(array, r)))
                .collect::<TimestampMicrosecondArray>()
                .with_timezone(TIMESTAMP_TZ),
        ),
        ColumnKind::Text => Arc::new(
            rows.map(|r| to_text(array, r))
                .collect::<StringArray>(),
        ),
        ColumnKind::Uuid => Arc::new(
            rows.map(|r| to_uuid(cell(array, r)))
                .collect::<StringArray>(),
        ),
        ColumnKind::Json => Arc::new(
            rows.map(|r| to_json(array, r))
                .collect::<StringArray>(),
        ),
    }
}

/// Nulls every present value strictly outside `[low, high]`.
///
/// Returns the bounded array and the number of cells that were nulled.
pub fn apply_bounds(array: &ArrayRef, low: f64, high: f64) -> Result<(ArrayRef, usize)> {
    let mask: Vec<bool> = numeric_values(array.as_ref())
        .into_iter()
        .map(|v| matches!(v, Some(v) if v < low || v > high))
        .collect();
    let count = mask.iter().filter(|m| **m).count();
    Ok((null_where(array, &mask)?, count))
}

fn to_i64(cell: Cell<'_>) -> Option<i64> {
    match cell {
        Cell::Int(v) => Some(v),
        Cell::Float(v) => integral(v),
        Cell::Bool(v) => Some(v as i64),
        Cell::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn to_f64(cell: Cell<'_>) -> Option<f64> {
    let value = match cell {
        Cell::Int(v) => Some(v as f64),
        Cell::Float(v) => Some(v),
        Cell::Bool(v) => Some(if v { 1.0 } else { 0.0 }),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn to_bool(cell: Cell<'_>) -> Option<bool> {
    match cell {
        Cell::Bool(v) => Some(v),
        Cell::Int(0) => Some(false),
        Cell::Int(1) => Some(true),
        Cell::Float(v) if v == 0.0 => Some(false),
        Cell::Float(v) if v == 1.0 => Some(true),
        Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_date(cell: Cell<'_>) -> Option<i32> {
    match cell {
        Cell::Date(d) => Some(d),
        Cell::Timestamp(us) => i32::try_from(us.div_euclid(MICROS_PER_DAY)).ok(),
        Cell::Text(s) => parse_date(s.trim()).map(date_to_days),
        _ => None,
    }
}

fn to_timestamp(cell: Cell<'_>) -> Option<i64> {
    match cell {
        Cell::Timestamp(us) => Some(us),
        Cell::Date(d) => (d as i64).checked_mul(MICROS_PER_DAY),
        Cell::Text(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

fn to_text(array: &dyn Array, row: usize) -> Option<String> {
    match cell(array, row) {
        Cell::Text(s) if s.trim().is_empty() => None,
        _ => batch::cell_text(array, row),
    }
}

fn to_uuid(cell: Cell<'_>) -> Option<String> {
    match cell {
        Cell::Text(s) => uuid::Uuid::parse_str(s.trim())
            .ok()
            .map(|u| u.hyphenated().to_string()),
        _ => None,
    }
}

fn to_json(array: &dyn Array, row: usize) -> Option<String> {
    let value = match cell(array, row) {
        Cell::Null => return None,
        Cell::Text(s) => serde_json::from_str::<serde_json::Value>(s).ok()?,
        Cell::Int(v) => serde_json::Value::from(v),
        Cell::Float(v) => serde_json::Number::from_f64(v).map(serde_json::Value::Number)?,
        Cell::Bool(v) => serde_json::Value::Bool(v),
        Cell::Date(_) | Cell::Timestamp(_) => {
            serde_json::Value::String(batch::cell_text(array, row)?)
        }
    };
    Some(value.to_string())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.date()))
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn parse_timestamp(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_micros());
    }
    if let Some(dt) = parse_naive_datetime(s) {
        return Some(dt.and_utc().timestamp_micros());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_micros())
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::batch::cell_text;

    fn text(values: Vec<Option<&str>>) -> StringArray {
        StringArray::from(values)
    }

    #[test]
    fn test_integers_from_text_and_floats() {
        let input = text(vec![Some(" 42 "), Some("7.0"), Some("7.5"), Some("abc"), None]);
        let out = coerce(&input, ColumnKind::Int64);
        let out = out.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(out.value(0), 42);
        assert_eq!(out.value(1), 7);
        assert!(out.is_null(2));
        assert!(out.is_null(3));
        assert!(out.is_null(4));
    }

    #[test]
    fn test_int16_out_of_range_is_null() {
        let input = Int64Array::from(vec![100, 40_000]);
        let out = coerce(&input, ColumnKind::Int16);
        assert!(!out.is_null(0));
        assert!(out.is_null(1));
    }

    #[test]
    fn test_float_nan_becomes_null() {
        let input = Float64Array::from(vec![f64::NAN, 95.3]);
        let out = coerce(&input, ColumnKind::Float64);
        assert!(out.is_null(0));
        assert_eq!(cell(out.as_ref(), 1), Cell::Float(95.3));
    }

    #[test]
    fn test_boolean_spellings() {
        let input = text(vec![Some("Yes"), Some("f"), Some("0"), Some("maybe")]);
        let out = coerce(&input, ColumnKind::Boolean);
        let out = out.as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(out.value(0));
        assert!(!out.value(1));
        assert!(!out.value(2));
        assert!(out.is_null(3));
    }

    #[test]
    fn test_blank_text_is_null() {
        let input = text(vec![Some("  "), Some("FF")]);
        let out = coerce(&input, ColumnKind::Text);
        assert!(out.is_null(0));
        assert_eq!(cell_text(out.as_ref(), 1).as_deref(), Some("FF"));
    }

    #[test]
    fn test_dates_and_timestamps_from_text() {
        let input = text(vec![Some("2025-03-18"), Some("2025-03-18 19:05:00"), Some("18/03/2025")]);
        let dates = coerce(&input, ColumnKind::Date);
        assert_eq!(cell_text(dates.as_ref(), 0).as_deref(), Some("2025-03-18"));
        assert_eq!(cell_text(dates.as_ref(), 1).as_deref(), Some("2025-03-18"));
        assert!(dates.is_null(2));

        let stamps = coerce(&input, ColumnKind::Timestamp);
        assert_eq!(
            cell_text(stamps.as_ref(), 1).as_deref(),
            Some("2025-03-18T19:05:00.000000Z")
        );
        assert_eq!(
            cell_text(stamps.as_ref(), 0).as_deref(),
            Some("2025-03-18T00:00:00.000000Z")
        );
    }

    #[test]
    fn test_uuid_and_json_are_normalised() {
        let input = text(vec![
            Some("67E55044-10B1-426F-9247-BB680E5FE0C8"),
            Some("{ \"a\" : 1 }"),
            Some("not json or uuid"),
        ]);
        let uuids = coerce(&input, ColumnKind::Uuid);
        assert_eq!(
            cell_text(uuids.as_ref(), 0).as_deref(),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert!(uuids.is_null(1));

        let json = coerce(&input, ColumnKind::Json);
        assert_eq!(cell_text(json.as_ref(), 1).as_deref(), Some("{\"a\":1}"));
        assert!(json.is_null(2));
    }

    #[test]
    fn test_bounds_null_only_outside_values() {
        let input: ArrayRef = Arc::new(Float64Array::from(vec![Some(50.0), Some(120.0), None, Some(99.9)]));
        let (bounded, count) = apply_bounds(&input, 30.0, 110.0).unwrap();
        assert_eq!(count, 1);
        assert!(bounded.is_null(1));
        assert!(!bounded.is_null(3));

        let (again, count) = apply_bounds(&bounded, 30.0, 110.0).unwrap();
        assert_eq!(count, 0);
        assert_eq!(again.null_count(), bounded.null_count());
    }
}
