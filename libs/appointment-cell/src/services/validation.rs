use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{AppointmentError, BookAppointmentRequest, ValidatedBooking};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

fn invalid(message: &str) -> AppointmentError {
    AppointmentError::Validation(message.to_string())
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Boundary checks for a booking, in the order clients see them.
/// `today` is the server-local calendar date.
pub fn validate_booking(
    request: &BookAppointmentRequest,
    today: NaiveDate,
) -> Result<ValidatedBooking, AppointmentError> {
    let (Some(doctor_id), Some(patient_name), Some(patient_email), Some(date), Some(time)) = (
        required(&request.doctor_id),
        required(&request.patient_name),
        required(&request.patient_email),
        required(&request.date),
        required(&request.time),
    ) else {
        return Err(invalid("Please fill in all required fields"));
    };

    if patient_name.chars().count() < 2 {
        return Err(invalid("Full name must be at least 2 characters"));
    }

    if !is_valid_email(patient_email) {
        return Err(invalid("Please enter a valid email address"));
    }

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| invalid("Please select a valid date"))?;

    if date < today {
        return Err(invalid("Please select a future date"));
    }

    Ok(ValidatedBooking {
        doctor_id: doctor_id.to_string(),
        patient_name: patient_name.to_string(),
        patient_email: patient_email.to_lowercase(),
        date,
        time: time.to_string(),
    })
}
