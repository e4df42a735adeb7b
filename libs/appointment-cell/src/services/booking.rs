// libs/appointment-cell/src/services/booking.rs
use chrono::{DateTime, Local, NaiveDate, SubsecRound, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::services::availability::{contains_slot, remove_slot, restore_slot};
use doctor_cell::services::doctor::{load_doctor, store_slots};
use shared_database::rusqlite::{
    self, ffi, params, params_from_iter, types::Value, Connection, OptionalExtension,
};
use shared_database::{timestamp, Database, DatabaseError};
use shared_models::response::{Page, Pagination};

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    BookAppointmentRequest, ValidatedBooking, APPOINTMENT_COLUMNS,
};
use crate::services::events::{LedgerChange, SharedObserver};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::validation::validate_booking;

pub struct AppointmentBookingService {
    db: Database,
    observer: SharedObserver,
}

impl AppointmentBookingService {
    pub fn new(db: Database, observer: SharedObserver) -> Self {
        Self { db, observer }
    }

    /// Book against the server-local calendar date.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.book_appointment_on(request, Local::now().date_naive()).await
    }

    /// Validate the request, then atomically check the slot, insert the
    /// appointment and remove the slot from the doctor's calendar.
    #[instrument(skip(self, request), fields(doctor_id = ?request.doctor_id))]
    pub async fn book_appointment_on(
        &self,
        request: BookAppointmentRequest,
        today: NaiveDate,
    ) -> Result<Appointment, AppointmentError> {
        let booking = validate_booking(&request, today)?;
        debug!("Booking {} {} with doctor {}", booking.date, booking.time, booking.doctor_id);

        let appointment = self
            .db
            .transaction(move |tx| book_in_transaction(tx, booking))
            .await?;

        info!(
            "Appointment {} booked with doctor {} for {} {}",
            appointment.id, appointment.doctor_id, appointment.date, appointment.time
        );
        self.observer.ledger_changed(LedgerChange::Booked);

        Ok(appointment)
    }

    /// Mark an appointment cancelled and offer its slot again.
    #[instrument(skip(self))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        let id = appointment_id.to_string();

        let appointment = self
            .db
            .transaction(move |tx| cancel_in_transaction(tx, &id))
            .await?;

        info!(
            "Appointment {} cancelled, slot {} {} released",
            appointment.id, appointment.date, appointment.time
        );
        self.observer.ledger_changed(LedgerChange::Cancelled);

        Ok(appointment)
    }

    /// Appointments filtered by patient email and status, newest slot first.
    #[instrument(skip(self))]
    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
        pagination: Pagination,
    ) -> Result<Page<Appointment>, AppointmentError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(email) = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            clauses.push("patient_email = ?");
            values.push(Value::Text(email.to_lowercase()));
        }

        if let Some(status) = query.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let status: AppointmentStatus = status.parse()?;
            clauses.push("status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let page = self
            .db
            .call(move |conn| {
                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM appointments {where_sql}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )?;

                let mut page_values = values;
                page_values.push(Value::Integer(pagination.limit));
                page_values.push(Value::Integer(pagination.offset));

                let mut stmt = conn.prepare(&format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments {where_sql}
                     ORDER BY date DESC, time DESC LIMIT ? OFFSET ?"
                ))?;
                let items = stmt
                    .query_map(params_from_iter(page_values.iter()), Appointment::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok::<_, DatabaseError>(Page { items, total })
            })
            .await?;

        debug!("Found {} of {} appointments", page.items.len(), page.total);
        Ok(page)
    }
}

/// Millisecond precision, matching what is stored.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn load_appointment(
    conn: &Connection,
    appointment_id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let appointment = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            [appointment_id],
            Appointment::from_row,
        )
        .optional()?;
    Ok(appointment)
}

fn slot_is_booked(
    conn: &Connection,
    doctor_id: &str,
    date: &str,
    time: &str,
) -> Result<bool, DatabaseError> {
    let booked = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM appointments
             WHERE doctor_id = ?1 AND date = ?2 AND time = ?3 AND status != 'cancelled'
         )",
        params![doctor_id, date, time],
        |row| row.get(0),
    )?;
    Ok(booked)
}

fn book_in_transaction(
    tx: &Connection,
    booking: ValidatedBooking,
) -> Result<Appointment, AppointmentError> {
    let doctor = load_doctor(tx, &booking.doctor_id)?.ok_or(AppointmentError::DoctorNotFound)?;
    let date = booking.date.format("%Y-%m-%d").to_string();

    let mut calendar = doctor.available_slots;
    if !contains_slot(&calendar, &date, &booking.time) {
        return Err(AppointmentError::SlotUnavailable);
    }

    if slot_is_booked(tx, &doctor.id, &date, &booking.time)? {
        return Err(AppointmentError::SlotTaken);
    }

    let created_at = now();
    let stamp = timestamp(created_at);
    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        doctor_id: doctor.id.clone(),
        doctor_name: doctor.name,
        patient_name: booking.patient_name,
        patient_email: booking.patient_email,
        date,
        time: booking.time,
        consultation_fee: doctor.consultation_fee,
        status: AppointmentStatus::Confirmed,
        created_at,
        updated_at: created_at,
    };

    let inserted = tx.execute(
        &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)"
        ),
        params![
            appointment.id,
            appointment.doctor_id,
            appointment.doctor_name,
            appointment.patient_name,
            appointment.patient_email,
            appointment.date,
            appointment.time,
            appointment.consultation_fee,
            appointment.status.as_str(),
            stamp,
        ],
    );

    match inserted {
        Ok(_) => {}
        // Only the active-slot index counts as a lost race; other constraint
        // failures are storage errors.
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            return Err(AppointmentError::SlotTaken);
        }
        Err(e) => return Err(DatabaseError::from(e).into()),
    }

    remove_slot(&mut calendar, &appointment.date, &appointment.time);
    store_slots(tx, &doctor.id, &calendar, &stamp)?;

    Ok(appointment)
}

fn cancel_in_transaction(tx: &Connection, appointment_id: &str) -> Result<Appointment, AppointmentError> {
    let appointment = load_appointment(tx, appointment_id)?.ok_or(AppointmentError::NotFound)?;

    AppointmentLifecycleService::new()
        .validate_status_transition(appointment.status, AppointmentStatus::Cancelled)?;

    let updated_at = now();
    let stamp = timestamp(updated_at);
    tx.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![AppointmentStatus::Cancelled.as_str(), stamp, appointment.id],
    )
    .map_err(DatabaseError::from)?;

    match load_doctor(tx, &appointment.doctor_id)? {
        Some(doctor) => {
            let mut calendar = doctor.available_slots;
            if restore_slot(&mut calendar, &appointment.date, &appointment.time) {
                store_slots(tx, &doctor.id, &calendar, &stamp)?;
            } else {
                debug!("Slot {} {} already offered again", appointment.date, appointment.time);
            }
        }
        None => warn!(
            "Doctor {} no longer exists, slot for appointment {} not restored",
            appointment.doctor_id, appointment.id
        ),
    }

    Ok(Appointment {
        status: AppointmentStatus::Cancelled,
        updated_at,
        ..appointment
    })
}
