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

//! # Type Mapping Logic
//!
//! This module is the "Translator". Each `ColumnKind` is mapped to two things:
//! 1. **Arrow Type**: the in-memory representation a coerced column ends up in.
//! 2. **PostgreSQL DDL Type**: the physical type used in `CREATE TABLE` statements.
//!
//! `Uuid` and `Json` values are validated during coercion but kept as text in
//! memory; the database casts them on insert.

use crate::domain::contract::ColumnKind;
use arrow::datatypes::{DataType, TimeUnit};

/// Timezone attached to every coerced timestamp column.
pub const TIMESTAMP_TZ: &str = "UTC";

/// Returns the Arrow DataType a column of this kind is coerced into.
pub fn map_kind_to_arrow(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Int64 => DataType::Int64,
        ColumnKind::Int16 => DataType::Int16,
        ColumnKind::Float64 => DataType::Float64,
        ColumnKind::Boolean => DataType::Boolean,
        ColumnKind::Date => DataType::Date32,
        ColumnKind::Timestamp => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TZ.into()))
        }
        ColumnKind::Text | ColumnKind::Uuid | ColumnKind::Json => DataType::Utf8,
    }
}

/// Returns the PostgreSQL type used in generated DDL.
pub fn map_kind_to_pg_ddl(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Int64 => "BIGINT",
        ColumnKind::Int16 => "SMALLINT",
        ColumnKind::Float64 => "DOUBLE PRECISION",
        ColumnKind::Text => "TEXT",
        ColumnKind::Boolean => "BOOLEAN",
        ColumnKind::Date => "DATE",
        ColumnKind::Timestamp => "TIMESTAMPTZ",
        ColumnKind::Uuid => "UUID",
        ColumnKind::Json => "JSONB",
    }
}

/// Returns the catalog `udt_name` PostgreSQL reports for a column of this kind.
pub fn map_kind_to_pg_udt(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Int64 => "int8",
        ColumnKind::Int16 => "int2",
        ColumnKind::Float64 => "float8",
        ColumnKind::Text => "text",
        ColumnKind::Boolean => "bool",
        ColumnKind::Date => "date",
        ColumnKind::Timestamp => "timestamptz",
        ColumnKind::Uuid => "uuid",
        ColumnKind::Json => "jsonb",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_numbers() {
        assert_eq!(map_kind_to_arrow(ColumnKind::Int64), DataType::Int64);
        assert_eq!(map_kind_to_arrow(ColumnKind::Int16), DataType::Int16);
        assert_eq!(map_kind_to_pg_ddl(ColumnKind::Float64), "DOUBLE PRECISION");
        assert_eq!(map_kind_to_pg_udt(ColumnKind::Json), "jsonb");
    }

    #[test]
    fn test_map_text_like_kinds() {
        assert_eq!(map_kind_to_arrow(ColumnKind::Uuid), DataType::Utf8);
        assert_eq!(map_kind_to_arrow(ColumnKind::Json), DataType::Utf8);
        assert_eq!(map_kind_to_pg_ddl(ColumnKind::Json), "JSONB");
    }

    #[test]
    fn test_map_dates() {
        assert_eq!(map_kind_to_arrow(ColumnKind::Date), DataType::Date32);
        assert_eq!(
            map_kind_to_arrow(ColumnKind::Timestamp),
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        );
        assert_eq!(map_kind_to_pg_ddl(ColumnKind::Timestamp), "TIMESTAMPTZ");
    }
}
