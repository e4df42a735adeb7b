use axum::extract::{Path, State};

use shared_database::Database;
use shared_models::error::AppError;
use shared_models::response::{ApiResponse, Pagination};
use shared_utils::extractor::ApiQuery;

use crate::models::{Doctor, DoctorSearchFilters, SpecializationCount};
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn search_doctors(
    State(db): State<Database>,
    ApiQuery(filters): ApiQuery<DoctorSearchFilters>,
) -> Result<ApiResponse<Vec<Doctor>>, AppError> {
    let pagination =
        Pagination::parse(filters.limit, filters.offset).map_err(AppError::ValidationError)?;

    let page = DoctorService::new(db)
        .search_doctors(filters, pagination)
        .await
        .map_err(|e| e.into_app_error("Error fetching doctors"))?;

    Ok(ApiResponse::page(page, pagination.offset))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(db): State<Database>,
    Path(doctor_id): Path<String>,
) -> Result<ApiResponse<Doctor>, AppError> {
    let doctor = DoctorService::new(db)
        .get_doctor(&doctor_id)
        .await
        .map_err(|e| e.into_app_error("Error fetching doctor"))?;

    Ok(ApiResponse::ok(doctor))
}

#[axum::debug_handler]
pub async fn list_specializations(
    State(db): State<Database>,
) -> Result<ApiResponse<Vec<SpecializationCount>>, AppError> {
    let specializations = DoctorService::new(db)
        .list_specializations()
        .await
        .map_err(|e| e.into_app_error("Error fetching specializations"))?;

    Ok(ApiResponse::ok(specializations))
}
