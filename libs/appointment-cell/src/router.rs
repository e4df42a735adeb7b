// libs/appointment-cell/src/router.rs
use axum::{
    routing::{get, patch},
    Router,
};

use shared_database::Database;

use crate::handlers;
use crate::services::events::SharedObserver;

#[derive(Clone)]
pub struct AppointmentState {
    pub db: Database,
    pub observer: SharedObserver,
}

impl AppointmentState {
    pub fn new(db: Database, observer: SharedObserver) -> Self {
        Self { db, observer }
    }
}

pub fn appointment_routes(state: AppointmentState) -> Router {
    Router::new()
        .route(
            "/appointments",
            get(handlers::search_appointments).post(handlers::book_appointment),
        )
        .route(
            "/appointments/{appointment_id}/cancel",
            patch(handlers::cancel_appointment),
        )
        .with_state(state)
}
