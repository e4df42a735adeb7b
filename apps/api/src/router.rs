use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::IntoResponse,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

use analytics_cell::analytics_routes;
use appointment_cell::{appointment_routes, AppointmentState, SharedObserver};
use doctor_cell::doctor_routes;
use monitoring_cell::{health_routes, HealthMonitorService};
use shared_config::AppConfig;
use shared_database::Database;
use shared_utils::{expose_error_details, rate_limit_middleware, RateLimiter};

pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("x-dns-prefetch-control", "off"),
];

pub fn create_router(config: &AppConfig, db: Database, observer: SharedObserver) -> anyhow::Result<Router> {
    let health = Arc::new(HealthMonitorService::new(db.clone(), env!("CARGO_PKG_VERSION")));

    let api = Router::new()
        .merge(doctor_routes(db.clone()))
        .merge(appointment_routes(AppointmentState::new(db.clone(), observer)))
        .merge(analytics_routes(db))
        .merge(health_routes(health));

    let mut app = Router::new().nest("/api", api).fallback(not_found);

    // Layers wrap outward: the last one added sees the request first.
    if config.is_development() {
        app = app.layer(middleware::from_fn(expose_error_details));
    }

    app = app
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            Arc::new(RateLimiter::from_config(config)),
            rate_limit_middleware,
        ));

    for (name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    let origin = HeaderValue::from_str(&config.frontend_url)
        .with_context(|| format!("invalid FRONTEND_URL '{}'", config.frontend_url))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(600));

    Ok(app
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "API endpoint not found",
            "path": uri.path()
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use appointment_cell::NoopObserver;
    use shared_utils::test_utils::{body_json, get_request, json_request, seeded_database, TestConfig};

    async fn app(test_config: TestConfig) -> Router {
        let config = test_config.to_app_config();
        let db = seeded_database(config.seed_base_date).await;
        create_router(&config, db, Arc::new(NoopObserver)).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let response = app(TestConfig::default())
            .await
            .oneshot(get_request("/api/nothing-here"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "API endpoint not found");
        assert_eq!(json["path"], "/api/nothing-here");
    }

    #[tokio::test]
    async fn test_cell_routes_are_nested_under_api() {
        let app = app(TestConfig::default()).await;

        let doctors = app.clone().oneshot(get_request("/api/doctors")).await.unwrap();
        assert_eq!(doctors.status(), StatusCode::OK);
        assert_eq!(body_json(doctors).await["total"], 6);

        let health = app.clone().oneshot(get_request("/api/health")).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(body_json(health).await["version"], env!("CARGO_PKG_VERSION"));

        let unprefixed = app.oneshot(get_request("/doctors")).await.unwrap();
        assert_eq!(unprefixed.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_security_and_rate_limit_headers() {
        let response = app(TestConfig::default())
            .await
            .oneshot(get_request("/api/specializations"))
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers["x-dns-prefetch-control"], "off");
        assert_eq!(headers["ratelimit-limit"], "1000");
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_with_429() {
        let app = app(TestConfig {
            rate_limit_max_requests: 2,
            ..TestConfig::default()
        })
        .await;

        for _ in 0..2 {
            let response = app.clone().oneshot(get_request("/api/doctors")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.oneshot(get_request("/api/doctors")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Too many requests, please try again later.");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/appointments")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app(TestConfig::default()).await.oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn test_booking_through_full_stack() {
        let test_config = TestConfig::default();
        let date = test_config.seed_base_date.format("%Y-%m-%d").to_string();
        let app = app(test_config).await;

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/appointments",
                &json!({
                    "doctorId": "1",
                    "patientName": "Asha Rao",
                    "patientEmail": "asha@example.com",
                    "date": date,
                    "time": "09:00 AM"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["data"]["id"].as_str().unwrap().to_string();

        let cancel = Request::builder()
            .method(Method::PATCH)
            .uri(format!("/api/appointments/{}/cancel", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(cancel).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], "cancelled");

        let doctor = app.oneshot(get_request("/api/doctors/1")).await.unwrap();
        let json = body_json(doctor).await;
        assert_eq!(json["data"]["availableSlots"][0]["slots"][0], "09:00 AM");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let body = "x".repeat(MAX_BODY_BYTES + 1);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/appointments")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        let response = app(TestConfig::default()).await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
