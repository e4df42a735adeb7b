use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::models::Appointment;
use shared_database::DatabaseError;
use shared_models::error::AppError;

/// Confirmed bookings and their fees for one creation day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: String,
    pub appointments: i64,
    pub revenue: i64,
}

/// Rollups derived from the doctor and appointment tables. Overwritten on
/// every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// Non-cancelled appointments.
    pub total_appointments: i64,
    pub total_doctors: i64,
    /// Distinct patient emails across all appointments.
    pub total_patients: i64,
    /// Fees of confirmed appointments created this calendar month (UTC).
    pub monthly_revenue: i64,
    pub available_doctors: i64,
    pub recent_appointments: Vec<Appointment>,
    pub speciality_stats: BTreeMap<String, i64>,
    pub monthly_stats: Vec<DailyStat>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Analytics have not been computed yet")]
    NotComputed,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AnalyticsError {
    pub fn into_app_error(self, context: &str) -> AppError {
        match self {
            AnalyticsError::NotComputed => AppError::NotFound(self.to_string()),
            AnalyticsError::Database(e) => AppError::database(context, e),
        }
    }
}
