use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::get_health_status;
use crate::services::HealthMonitorService;

pub fn health_routes(service: Arc<HealthMonitorService>) -> Router {
    Router::new()
        .route("/health", get(get_health_status))
        .with_state(service)
}
