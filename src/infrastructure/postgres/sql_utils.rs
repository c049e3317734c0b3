//! Utility functions for generating PostgreSQL statements.
//!
//! Identifiers are always double-quoted. Values are never inlined: every
//! cell is bound as a text parameter and cast to the destination column's
//! type inside the statement, so one code path handles every column type.

use crate::domain::entities::{DestinationColumn, LoadTarget};
use crate::domain::errors::{LoadError, Result};

/// Alias of the existing row inside the upsert statement.
const EXISTING_ALIAS: &str = "cur";

/// Quotes an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Checks that a catalog type name is safe to splice into a cast.
///
/// `udt_name` values are lowercase words such as `int8`, `timestamptz` or
/// `_text`; anything else is refused.
pub fn validate_cast_type(udt_name: &str) -> Result<&str> {
    let valid = !udt_name.is_empty()
        && udt_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(udt_name)
    } else {
        Err(LoadError::MetadataError(format!(
            "refusing to cast to unexpected type name '{}'",
            udt_name
        )))
    }
}

/// Builds the multi-row upsert for `rows` rows over `columns`.
///
/// Conflicts on the named constraint keep any non-null stored value and fill
/// stored nulls from the incoming row. A table whose columns are all key
/// columns has nothing to merge and ignores conflicting rows.
pub fn build_upsert_sql(
    target: &LoadTarget,
    columns: &[DestinationColumn],
    rows: usize,
) -> Result<String> {
    if columns.is_empty() || rows == 0 {
        return Err(LoadError::ConfigError(format!(
            "empty upsert for {}",
            target.qualified_name()
        )));
    }

    let casts = columns
        .iter()
        .map(|c| validate_cast_type(&c.sql_type))
        .collect::<Result<Vec<_>>>()?;

    let column_list = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let width = columns.len();
    let values = (0..rows)
        .map(|row| {
            let cells = casts
                .iter()
                .enumerate()
                .map(|(col, cast)| format!("${}::text::{}", row * width + col + 1, cast))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", cells)
        })
        .collect::<Vec<_>>()
        .join(", ");

    let updates = columns
        .iter()
        .filter(|c| !target.primary_key.contains(&c.name))
        .map(|c| {
            let col = quote_ident(&c.name);
            format!("{col} = COALESCE({EXISTING_ALIAS}.{col}, EXCLUDED.{col})")
        })
        .collect::<Vec<_>>();

    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    Ok(format!(
        "INSERT INTO {} AS {} ({}) VALUES {} ON CONFLICT ON CONSTRAINT {} {}",
        qualified_table(&target.schema, &target.table),
        EXISTING_ALIAS,
        column_list,
        values,
        quote_ident(&target.constraint),
        action
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> LoadTarget {
        LoadTarget {
            schema: "staging".to_string(),
            table: "statcast_pitches".to_string(),
            constraint: "statcast_pitches_pkey".to_string(),
            primary_key: vec!["game_pk".to_string(), "pitch_number".to_string()],
            defaulted_columns: vec![],
        }
    }

    #[test]
    fn test_upsert_merges_non_key_columns_with_coalesce() {
        let columns = vec![
            DestinationColumn::new("game_pk", "int8"),
            DestinationColumn::new("pitch_number", "int2"),
            DestinationColumn::new("release_speed", "float8"),
        ];
        let sql = build_upsert_sql(&target(), &columns, 2).unwrap();
        assert!(sql.starts_with(
            "INSERT INTO \"staging\".\"statcast_pitches\" AS cur (\"game_pk\", \"pitch_number\", \"release_speed\")"
        ));
        assert!(sql.contains("($1::text::int8, $2::text::int2, $3::text::float8), ($4::text::int8"));
        assert!(sql.contains("ON CONFLICT ON CONSTRAINT \"statcast_pitches_pkey\""));
        assert!(sql.ends_with(
            "DO UPDATE SET \"release_speed\" = COALESCE(cur.\"release_speed\", EXCLUDED.\"release_speed\")"
        ));
        assert!(!sql.contains("\"game_pk\" = COALESCE"));
    }

    #[test]
    fn test_key_only_table_does_nothing_on_conflict() {
        let columns = vec![
            DestinationColumn::new("game_pk", "int8"),
            DestinationColumn::new("pitch_number", "int2"),
        ];
        let sql = build_upsert_sql(&target(), &columns, 1).unwrap();
        assert!(sql.ends_with("DO NOTHING"));
    }

    #[test]
    fn test_suspicious_type_names_are_refused() {
        assert!(validate_cast_type("timestamptz").is_ok());
        assert!(validate_cast_type("_int4").is_ok());
        assert!(validate_cast_type("int8; DROP TABLE x").is_err());
        assert!(validate_cast_type("").is_err());
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}
