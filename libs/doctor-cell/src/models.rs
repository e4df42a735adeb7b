use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::row::{json_column, timestamp_column};
use shared_database::rusqlite;
use shared_database::DatabaseError;
use shared_models::error::AppError;

use crate::services::availability::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Unavailable,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Busy => "busy",
            AvailabilityStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvailabilityStatus {
    type Err = DoctorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(AvailabilityStatus::Available),
            "busy" => Ok(AvailabilityStatus::Busy),
            "unavailable" => Ok(AvailabilityStatus::Unavailable),
            _ => Err(DoctorError::Validation("Invalid availability status".to_string())),
        }
    }
}

/// Bookable times offered on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Display times such as `"09:00 AM"`.
    pub slots: Vec<String>,
}

impl DaySlots {
    pub fn new(date: impl Into<String>, slots: &[&str]) -> Self {
        Self {
            date: date.into(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub image: String,
    pub rating: f64,
    pub experience: i64,
    pub availability_status: AvailabilityStatus,
    pub consultation_fee: i64,
    pub location: String,
    pub about: String,
    pub education: Vec<String>,
    pub languages: Vec<String>,
    pub available_slots: Vec<DaySlots>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`Doctor::from_row`].
pub const DOCTOR_COLUMNS: &str = "id, name, specialization, image, rating, experience, \
     availability_status, consultation_fee, location, about, education, languages, \
     available_slots, created_at, updated_at";

impl Doctor {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get("availability_status")?;
        let availability_status = status.parse().map_err(|e: DoctorError| {
            let index = row.as_ref().column_index("availability_status").unwrap_or(0);
            rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            specialization: row.get("specialization")?,
            image: row.get("image")?,
            rating: row.get("rating")?,
            experience: row.get("experience")?,
            availability_status,
            consultation_fee: row.get("consultation_fee")?,
            location: row.get("location")?,
            about: row.get("about")?,
            education: json_column(row, "education")?,
            languages: json_column(row, "languages")?,
            available_slots: normalize(json_column(row, "available_slots")?),
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

/// Query string accepted by `GET /api/doctors`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchFilters {
    pub search: Option<String>,
    pub specialization: Option<String>,
    pub availability: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecializationCount {
    pub name: String,
    pub count: i64,
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl DoctorError {
    /// Map to the HTTP error; `context` becomes the message of 5xx responses.
    pub fn into_app_error(self, context: &str) -> AppError {
        match self {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::Validation(message) => AppError::ValidationError(message),
            DoctorError::Database(e) => AppError::database(context, e),
        }
    }
}
