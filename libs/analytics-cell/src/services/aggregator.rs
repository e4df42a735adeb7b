use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, SubsecRound, TimeZone, Utc};
use tracing::{debug, info, instrument};

use appointment_cell::models::{Appointment, APPOINTMENT_COLUMNS};
use shared_database::row::{json_column, timestamp_column};
use shared_database::rusqlite::{self, params, Connection, OptionalExtension};
use shared_database::{timestamp, Database, DatabaseError};

use crate::models::{AnalyticsError, AnalyticsSnapshot, DailyStat};

const RECENT_APPOINTMENTS: i64 = 10;
const DAILY_STATS_DAYS: i64 = 30;

pub struct AnalyticsService {
    db: Database,
}

impl AnalyticsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn recompute(&self) -> Result<AnalyticsSnapshot, AnalyticsError> {
        self.recompute_at(Utc::now()).await
    }

    /// Rebuild the snapshot from the raw tables and overwrite the stored row.
    #[instrument(skip(self))]
    pub async fn recompute_at(&self, now: DateTime<Utc>) -> Result<AnalyticsSnapshot, AnalyticsError> {
        let now = now.trunc_subsecs(3);

        let snapshot = self
            .db
            .transaction(move |tx| {
                let snapshot = compute_snapshot(tx, now)?;
                store_snapshot(tx, &snapshot)?;
                Ok::<_, DatabaseError>(snapshot)
            })
            .await?;

        info!(
            "Analytics updated: {} appointments, {} patients, revenue {}",
            snapshot.total_appointments, snapshot.total_patients, snapshot.monthly_revenue
        );
        Ok(snapshot)
    }

    /// The last stored snapshot.
    pub async fn load(&self) -> Result<AnalyticsSnapshot, AnalyticsError> {
        let snapshot = self.db.call(|conn| load_snapshot(conn)).await?;
        snapshot.ok_or(AnalyticsError::NotComputed)
    }
}

fn count(conn: &Connection, sql: &str) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let next = first.checked_add_months(Months::new(1)).unwrap_or(first);

    let start = Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN));
    let end = Utc.from_utc_datetime(&next.and_time(chrono::NaiveTime::MIN));
    (start, end)
}

/// First calendar day (UTC) of the daily stats window. Whole days count, so
/// the oldest bucket is never cut off mid-day.
fn daily_window_start(now: DateTime<Utc>) -> String {
    (now.date_naive() - Duration::days(DAILY_STATS_DAYS))
        .format("%Y-%m-%d")
        .to_string()
}

pub fn compute_snapshot(conn: &Connection, now: DateTime<Utc>) -> Result<AnalyticsSnapshot, DatabaseError> {
    let total_appointments = count(conn, "SELECT COUNT(*) FROM appointments WHERE status != 'cancelled'")?;
    let total_doctors = count(conn, "SELECT COUNT(*) FROM doctors")?;
    let total_patients = count(conn, "SELECT COUNT(DISTINCT patient_email) FROM appointments")?;
    let available_doctors = count(
        conn,
        "SELECT COUNT(*) FROM doctors WHERE availability_status = 'available'",
    )?;

    let (month_start, month_end) = month_bounds(now);
    let monthly_revenue: i64 = conn.query_row(
        "SELECT COALESCE(SUM(consultation_fee), 0) FROM appointments
         WHERE status = 'confirmed' AND created_at >= ?1 AND created_at < ?2",
        params![timestamp(month_start), timestamp(month_end)],
        |row| row.get(0),
    )?;

    let recent_appointments = {
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE status = 'confirmed'
             ORDER BY created_at DESC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map([RECENT_APPOINTMENTS], Appointment::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    let speciality_stats = {
        let mut stmt = conn.prepare("SELECT specialization, COUNT(*) FROM doctors GROUP BY specialization")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        rows
    };

    let first_day = daily_window_start(now);
    let monthly_stats = {
        let mut stmt = conn.prepare(
            "SELECT substr(created_at, 1, 10) AS day, COUNT(*), COALESCE(SUM(consultation_fee), 0)
             FROM appointments
             WHERE status = 'confirmed' AND substr(created_at, 1, 10) >= ?1
             GROUP BY day ORDER BY day DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![first_day, DAILY_STATS_DAYS], |row| {
                Ok(DailyStat {
                    date: row.get(0)?,
                    appointments: row.get(1)?,
                    revenue: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    debug!(
        "Computed analytics: {} doctors, {} recent, {} daily rows",
        total_doctors,
        recent_appointments.len(),
        monthly_stats.len()
    );

    Ok(AnalyticsSnapshot {
        total_appointments,
        total_doctors,
        total_patients,
        monthly_revenue,
        available_doctors,
        recent_appointments,
        speciality_stats,
        monthly_stats,
        last_updated: now,
    })
}

fn store_snapshot(conn: &Connection, snapshot: &AnalyticsSnapshot) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR REPLACE INTO analytics
             (id, total_appointments, total_doctors, total_patients, monthly_revenue,
              available_doctors, recent_appointments, speciality_stats, monthly_stats, last_updated)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            snapshot.total_appointments,
            snapshot.total_doctors,
            snapshot.total_patients,
            snapshot.monthly_revenue,
            snapshot.available_doctors,
            serde_json::to_string(&snapshot.recent_appointments)?,
            serde_json::to_string(&snapshot.speciality_stats)?,
            serde_json::to_string(&snapshot.monthly_stats)?,
            timestamp(snapshot.last_updated),
        ],
    )?;
    Ok(())
}

fn load_snapshot(conn: &Connection) -> Result<Option<AnalyticsSnapshot>, DatabaseError> {
    let snapshot = conn
        .query_row(
            "SELECT total_appointments, total_doctors, total_patients, monthly_revenue,
                    available_doctors, recent_appointments, speciality_stats, monthly_stats,
                    last_updated
             FROM analytics WHERE id = 1",
            [],
            |row| {
                Ok(AnalyticsSnapshot {
                    total_appointments: row.get("total_appointments")?,
                    total_doctors: row.get("total_doctors")?,
                    total_patients: row.get("total_patients")?,
                    monthly_revenue: row.get("monthly_revenue")?,
                    available_doctors: row.get("available_doctors")?,
                    recent_appointments: json_column(row, "recent_appointments")?,
                    speciality_stats: json_column(row, "speciality_stats")?,
                    monthly_stats: json_column(row, "monthly_stats")?,
                    last_updated: timestamp_column(row, "last_updated")?,
                })
            },
        )
        .optional()?;
    Ok(snapshot)
}
