use axum::extract::{Path, State};

use shared_models::error::AppError;
use shared_models::response::{ApiResponse, Pagination};
use shared_utils::extractor::{ApiJson, ApiQuery};

use crate::models::{Appointment, AppointmentSearchQuery, BookAppointmentRequest};
use crate::router::AppointmentState;
use crate::services::AppointmentBookingService;

fn booking_service(state: AppointmentState) -> AppointmentBookingService {
    AppointmentBookingService::new(state.db, state.observer)
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    ApiJson(request): ApiJson<BookAppointmentRequest>,
) -> Result<ApiResponse<Appointment>, AppError> {
    let appointment = booking_service(state)
        .book_appointment(request)
        .await
        .map_err(|e| e.into_app_error("Error booking appointment"))?;

    Ok(ApiResponse::created(appointment).with_message("Appointment booked successfully"))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<AppointmentState>,
    ApiQuery(query): ApiQuery<AppointmentSearchQuery>,
) -> Result<ApiResponse<Vec<Appointment>>, AppError> {
    let pagination =
        Pagination::parse(query.limit, query.offset).map_err(AppError::ValidationError)?;

    let page = booking_service(state)
        .search_appointments(query, pagination)
        .await
        .map_err(|e| e.into_app_error("Error fetching appointments"))?;

    Ok(ApiResponse::page(page, pagination.offset))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<String>,
) -> Result<ApiResponse<Appointment>, AppError> {
    let appointment = booking_service(state)
        .cancel_appointment(&appointment_id)
        .await
        .map_err(|e| e.into_app_error("Error cancelling appointment"))?;

    Ok(ApiResponse::ok(appointment).with_message("Appointment cancelled successfully"))
}
