// =====================================================================================
// MONITORING CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

pub const HEALTHY_MESSAGE: &str = "NirogGyan API is running";
pub const UNAVAILABLE_MESSAGE: &str = "Service unavailable";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub connected: bool,
    /// Round trip of the probe query, rendered as e.g. "3ms".
    pub response_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStats {
    pub total_doctors: i64,
    pub total_appointments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    /// Whole seconds since the service started.
    pub uptime: u64,
    pub database: DatabaseHealth,
    pub stats: HealthStats,
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Database unreachable: {0}")]
    DatabaseUnavailable(#[from] DatabaseError),
}

impl MonitoringError {
    pub fn into_app_error(self) -> AppError {
        match self {
            MonitoringError::DatabaseUnavailable(e) => AppError::ServiceUnavailable {
                message: UNAVAILABLE_MESSAGE.to_string(),
                detail: e.to_string(),
            },
        }
    }
}
