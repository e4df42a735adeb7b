use axum::{routing::get, Router};

use shared_database::Database;

use crate::handlers;

pub fn doctor_routes(db: Database) -> Router {
    Router::new()
        .route("/doctors", get(handlers::search_doctors))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/specializations", get(handlers::list_specializations))
        .with_state(db)
}
