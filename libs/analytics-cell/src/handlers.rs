use axum::extract::State;

use shared_database::Database;
use shared_models::error::AppError;
use shared_models::response::ApiResponse;

use crate::models::AnalyticsSnapshot;
use crate::services::AnalyticsService;

/// Recomputes before answering so the figures reflect every committed booking.
#[axum::debug_handler]
pub async fn get_analytics(
    State(db): State<Database>,
) -> Result<ApiResponse<AnalyticsSnapshot>, AppError> {
    let service = AnalyticsService::new(db);

    service
        .recompute()
        .await
        .map_err(|e| e.into_app_error("Error updating analytics"))?;

    let snapshot = service
        .load()
        .await
        .map_err(|e| e.into_app_error("Error fetching analytics"))?;

    Ok(ApiResponse::ok(snapshot))
}
