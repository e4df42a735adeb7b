use axum::{routing::get, Router};

use shared_database::Database;

use crate::handlers;

pub fn analytics_routes(db: Database) -> Router {
    Router::new()
        .route("/analytics", get(handlers::get_analytics))
        .with_state(db)
}
