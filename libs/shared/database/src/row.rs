//! Column decoding helpers for the JSON and timestamp text columns.

use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Row};
use serde::de::DeserializeOwned;

fn conversion_error(
    row: &Row<'_>,
    column: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

/// Decode a JSON text column.
pub fn json_column<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(row, column, e))
}

/// Decode an RFC 3339 timestamp column.
pub fn timestamp_column(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, column, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_decode_columns() {
        let conn = Connection::open_in_memory().unwrap();
        let (list, at): (Vec<String>, DateTime<Utc>) = conn
            .query_row(
                "SELECT '[\"English\",\"Hindi\"]' AS languages, '2025-08-10T09:30:00.000Z' AS created_at",
                [],
                |row| Ok((json_column(row, "languages")?, timestamp_column(row, "created_at")?)),
            )
            .unwrap();

        assert_eq!(list, vec!["English", "Hindi"]);
        assert_eq!(at.to_rfc3339(), "2025-08-10T09:30:00+00:00");
    }

    #[test]
    fn test_malformed_json_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.query_row("SELECT 'not json' AS slots", [], |row| {
            json_column::<Vec<String>>(row, "slots")
        });

        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(0, Type::Text, _))
        ));
    }
}
