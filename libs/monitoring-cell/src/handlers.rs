use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::instrument;

use shared_models::error::AppError;

use crate::models::HealthReport;
use crate::services::HealthMonitorService;

#[axum::debug_handler]
#[instrument(skip(service))]
pub async fn get_health_status(
    State(service): State<Arc<HealthMonitorService>>,
) -> Result<Json<HealthReport>, AppError> {
    let report = service.check().await.map_err(|e| e.into_app_error())?;
    Ok(Json(report))
}
