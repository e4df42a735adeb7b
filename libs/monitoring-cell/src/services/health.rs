// =====================================================================================
// HEALTH MONITORING SERVICE
// =====================================================================================

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, instrument};

use shared_database::{Database, DatabaseError};

use crate::models::{DatabaseHealth, HealthReport, HealthStats, MonitoringError, HEALTHY_MESSAGE};

pub struct HealthMonitorService {
    start_time: Instant,
    version: String,
    db: Database,
}

impl HealthMonitorService {
    /// `version` is the release string reported to clients, normally the
    /// server binary's package version.
    pub fn new(db: Database, version: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            version: version.into(),
            db,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Probe the database and gather row counts. Any storage failure means
    /// the service is unavailable.
    #[instrument(skip(self))]
    pub async fn check(&self) -> Result<HealthReport, MonitoringError> {
        let probe_started = Instant::now();
        self.db.ping().await?;
        let response_time_ms = probe_started.elapsed().as_millis();

        let stats = self
            .db
            .call(|conn| {
                let total_doctors = conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
                let total_appointments =
                    conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;
                Ok::<_, DatabaseError>(HealthStats {
                    total_doctors,
                    total_appointments,
                })
            })
            .await?;

        debug!("Database probe answered in {}ms", response_time_ms);

        Ok(HealthReport {
            success: true,
            message: HEALTHY_MESSAGE.to_string(),
            timestamp: Utc::now(),
            version: self.version.clone(),
            uptime: self.uptime_seconds(),
            database: DatabaseHealth {
                connected: true,
                response_time: format!("{}ms", response_time_ms),
            },
            stats,
        })
    }
}
