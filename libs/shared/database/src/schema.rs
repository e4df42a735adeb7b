//! SQLite schema for doctors, appointments and the analytics snapshot.

use rusqlite::Connection;
use tracing::info;

use crate::error::{DatabaseError, Result};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 2;

const VERSION_KEY: &str = "schema_version";

pub const CREATE_DOCTORS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    specialization TEXT NOT NULL,
    image TEXT NOT NULL DEFAULT '',
    rating REAL NOT NULL DEFAULT 0 CHECK(rating >= 0 AND rating <= 5),
    experience INTEGER NOT NULL DEFAULT 0 CHECK(experience >= 0),
    availability_status TEXT NOT NULL DEFAULT 'available'
        CHECK(availability_status IN ('available', 'busy', 'unavailable')),
    consultation_fee INTEGER NOT NULL DEFAULT 0 CHECK(consultation_fee >= 0),
    location TEXT NOT NULL DEFAULT '',
    about TEXT NOT NULL DEFAULT '',
    education TEXT NOT NULL DEFAULT '[]',
    languages TEXT NOT NULL DEFAULT '[]',
    available_slots TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_APPOINTMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    doctor_name TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    patient_email TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    consultation_fee INTEGER NOT NULL CHECK(consultation_fee >= 0),
    status TEXT NOT NULL DEFAULT 'confirmed'
        CHECK(status IN ('confirmed', 'pending', 'cancelled')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// At most one non-cancelled appointment per doctor slot.
pub const CREATE_ACTIVE_SLOT_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_slot
    ON appointments(doctor_id, date, time) WHERE status != 'cancelled'
";

pub const CREATE_APPOINTMENT_INDEXES: &str = r"
CREATE INDEX IF NOT EXISTS idx_appointments_patient_email ON appointments(patient_email);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor_id ON appointments(doctor_id);
CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
CREATE INDEX IF NOT EXISTS idx_appointments_created_at ON appointments(created_at);
";

pub const CREATE_DOCTOR_INDEXES: &str = r"
CREATE INDEX IF NOT EXISTS idx_doctors_specialization ON doctors(specialization);
CREATE INDEX IF NOT EXISTS idx_doctors_availability ON doctors(availability_status);
";

pub const CREATE_ANALYTICS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS analytics (
    id INTEGER PRIMARY KEY CHECK(id = 1),
    total_appointments INTEGER NOT NULL DEFAULT 0 CHECK(total_appointments >= 0),
    total_doctors INTEGER NOT NULL DEFAULT 0 CHECK(total_doctors >= 0),
    total_patients INTEGER NOT NULL DEFAULT 0 CHECK(total_patients >= 0),
    monthly_revenue INTEGER NOT NULL DEFAULT 0 CHECK(monthly_revenue >= 0),
    available_doctors INTEGER NOT NULL DEFAULT 0 CHECK(available_doctors >= 0),
    recent_appointments TEXT NOT NULL DEFAULT '[]',
    speciality_stats TEXT NOT NULL DEFAULT '{}',
    monthly_stats TEXT NOT NULL DEFAULT '[]',
    last_updated TEXT NOT NULL
)
";

pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_METADATA_TABLE,
    CREATE_DOCTORS_TABLE,
    CREATE_DOCTOR_INDEXES,
    CREATE_APPOINTMENTS_TABLE,
    CREATE_ACTIVE_SLOT_INDEX,
    CREATE_APPOINTMENT_INDEXES,
    CREATE_ANALYTICS_TABLE,
];

/// Creates all tables and indexes if missing and records the schema version.
///
/// # Errors
///
/// Returns an error if a statement fails or the stored version is newer
/// than this build understands.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute_batch(statement)?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(DatabaseError::Migration(format!(
            "database schema version {version} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if version == 1 {
        rebuild_appointments_table(conn)?;
    }

    if version < CURRENT_VERSION {
        conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (VERSION_KEY, CURRENT_VERSION.to_string()),
        )?;
    }

    Ok(())
}

/// Version 1 carried a `LIKE` email check stricter than booking validation.
/// SQLite cannot drop a column constraint in place, so the table is rebuilt
/// and its rows copied over.
fn rebuild_appointments_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "BEGIN;
         ALTER TABLE appointments RENAME TO appointments_v1;
         {CREATE_APPOINTMENTS_TABLE};
         INSERT INTO appointments SELECT * FROM appointments_v1;
         DROP TABLE appointments_v1;
         {CREATE_ACTIVE_SLOT_INDEX};
         {CREATE_APPOINTMENT_INDEXES}
         COMMIT;"
    ))
    .map_err(|e| DatabaseError::Migration(format!("rebuilding appointments table: {e}")))?;

    info!("Migrated appointments table to schema version 2");
    Ok(())
}

/// Returns 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value
            .parse()
            .map_err(|_| DatabaseError::Migration(format!("invalid schema version: {value}"))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}
