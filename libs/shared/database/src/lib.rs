//! SQLite storage shared by every cell: connection handle, schema and seed data.

pub mod error;
pub mod row;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use error::{DatabaseError, Result};
pub use rusqlite;
pub use sqlite::Database;

/// Timestamps are stored as RFC 3339 UTC strings with millisecond precision
/// so that lexical order matches chronological order.
pub fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
