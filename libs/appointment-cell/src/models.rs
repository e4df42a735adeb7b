use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::row::timestamp_column;
use shared_database::rusqlite;
use shared_database::DatabaseError;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Pending,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "pending" => Ok(AppointmentStatus::Pending),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(AppointmentError::Validation(
                "Invalid appointment status".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub patient_name: String,
    pub patient_email: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub time: String,
    pub consultation_fee: i64,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`Appointment::from_row`].
pub const APPOINTMENT_COLUMNS: &str = "id, doctor_id, doctor_name, patient_name, patient_email, \
     date, time, consultation_fee, status, created_at, updated_at";

impl Appointment {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        let status = status.parse().map_err(|e: AppointmentError| {
            let index = row.as_ref().column_index("status").unwrap_or(0);
            rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: row.get("id")?,
            doctor_id: row.get("doctor_id")?,
            doctor_name: row.get("doctor_name")?,
            patient_name: row.get("patient_name")?,
            patient_email: row.get("patient_email")?,
            date: row.get("date")?,
            time: row.get("time")?,
            consultation_fee: row.get("consultation_fee")?,
            status,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Body of `POST /api/appointments`. Every field is optional at the wire
/// level so that missing values produce the booking validation message
/// instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// A booking request that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub doctor_id: String,
    /// Trimmed.
    pub patient_name: String,
    /// Trimmed and lower-cased.
    pub patient_email: String,
    pub date: NaiveDate,
    pub time: String,
}

/// Query string accepted by `GET /api/appointments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSearchQuery {
    pub email: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    NotFound,

    #[error("Selected time slot is not available")]
    SlotUnavailable,

    #[error("This time slot is already booked")]
    SlotTaken,

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AppointmentError {
    /// Map to the HTTP error; `context` becomes the message of 5xx responses.
    pub fn into_app_error(self, context: &str) -> AppError {
        match self {
            AppointmentError::Validation(message) => AppError::ValidationError(message),
            AppointmentError::DoctorNotFound | AppointmentError::NotFound => {
                AppError::NotFound(self.to_string())
            }
            AppointmentError::SlotUnavailable
            | AppointmentError::SlotTaken
            | AppointmentError::AlreadyCancelled
            | AppointmentError::InvalidStatusTransition { .. } => {
                AppError::Conflict(self.to_string())
            }
            AppointmentError::Database(e) => AppError::database(context, e),
        }
    }
}
