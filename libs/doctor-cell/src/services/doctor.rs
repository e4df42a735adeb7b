use tracing::{debug, instrument};

use shared_database::rusqlite::{self, params, params_from_iter, types::Value, Connection, OptionalExtension};
use shared_database::{Database, DatabaseError};
use shared_models::response::{Page, Pagination};

use crate::models::{
    AvailabilityStatus, DaySlots, Doctor, DoctorError, DoctorSearchFilters, SpecializationCount,
    DOCTOR_COLUMNS,
};

pub struct DoctorService {
    db: Database,
}

impl DoctorService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Filtered, paginated directory listing ordered by rating then name.
    #[instrument(skip(self))]
    pub async fn search_doctors(
        &self,
        filters: DoctorSearchFilters,
        pagination: Pagination,
    ) -> Result<Page<Doctor>, DoctorError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clauses.push(
                "(LOWER(name) LIKE ? ESCAPE '\\' OR LOWER(specialization) LIKE ? ESCAPE '\\')",
            );
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }

        if let Some(specialization) = filters
            .specialization
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            clauses.push("specialization = ?");
            values.push(Value::Text(specialization.to_string()));
        }

        if let Some(availability) = filters
            .availability
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            let status: AvailabilityStatus = availability.parse()?;
            clauses.push("availability_status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        debug!("Searching doctors: {} {:?}", where_sql, pagination);

        let page = self
            .db
            .call(move |conn| {
                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM doctors {where_sql}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )?;

                let mut page_values = values;
                page_values.push(Value::Integer(pagination.limit));
                page_values.push(Value::Integer(pagination.offset));

                let mut stmt = conn.prepare(&format!(
                    "SELECT {DOCTOR_COLUMNS} FROM doctors {where_sql}
                     ORDER BY rating DESC, name ASC LIMIT ? OFFSET ?"
                ))?;
                let items = stmt
                    .query_map(params_from_iter(page_values.iter()), Doctor::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok::<_, DatabaseError>(Page { items, total })
            })
            .await?;

        debug!("Found {} of {} doctors", page.items.len(), page.total);
        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        let id = doctor_id.to_string();
        let doctor = self
            .db
            .call(move |conn| load_doctor(conn, &id))
            .await?;

        doctor.ok_or(DoctorError::NotFound)
    }

    /// Distinct specializations with their doctor counts, by name.
    #[instrument(skip(self))]
    pub async fn list_specializations(&self) -> Result<Vec<SpecializationCount>, DoctorError> {
        let specializations = self
            .db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT specialization, COUNT(*) FROM doctors
                     GROUP BY specialization ORDER BY specialization ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(SpecializationCount {
                            name: row.get(0)?,
                            count: row.get(1)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok::<_, DatabaseError>(rows)
            })
            .await?;

        Ok(specializations)
    }
}

/// Load one doctor on an already-held connection or transaction.
pub fn load_doctor(conn: &Connection, doctor_id: &str) -> Result<Option<Doctor>, DatabaseError> {
    let doctor = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
            [doctor_id],
            Doctor::from_row,
        )
        .optional()?;
    Ok(doctor)
}

/// Overwrite a doctor's slot calendar. Returns false if the doctor is gone.
pub fn store_slots(
    conn: &Connection,
    doctor_id: &str,
    calendar: &[DaySlots],
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET available_slots = ?1, updated_at = ?2 WHERE id = ?3",
        params![serde_json::to_string(calendar)?, updated_at, doctor_id],
    )?;
    Ok(changed == 1)
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
