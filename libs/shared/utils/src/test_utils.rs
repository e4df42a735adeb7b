//! Fixtures shared by the cell test suites.

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
};
use chrono::NaiveDate;
use serde_json::Value;

use shared_config::{AppConfig, Environment};
use shared_database::{seed::seed_sample_doctors, Database};

/// First date of the seeded calendars in service-level tests.
pub fn seed_base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 10).expect("valid fixture date")
}

/// "Today" for service-level tests: before every seeded slot.
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).expect("valid fixture date")
}

pub struct TestConfig {
    pub rate_limit_max_requests: u32,
    pub seed_base_date: NaiveDate,
    pub environment: Environment,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            rate_limit_max_requests: 1_000,
            seed_base_date: AppConfig::default().seed_base_date,
            environment: Environment::Development,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_file: ":memory:".to_string(),
            rate_limit_max_requests: self.rate_limit_max_requests,
            environment: self.environment,
            seed_base_date: self.seed_base_date,
            ..AppConfig::default()
        }
    }
}

/// In-memory database holding the six sample doctors.
pub async fn seeded_database(base_date: NaiveDate) -> Database {
    let db = Database::open_in_memory().expect("open in-memory database");
    seed_sample_doctors(&db, base_date)
        .await
        .expect("seed sample doctors");
    db
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.database_file, ":memory:");
        assert!(config.is_development());
        assert!(config.is_configured());
    }

    #[test]
    fn test_fixed_today_precedes_seed() {
        assert!(fixed_today() < seed_base_date());
    }

    #[test]
    fn test_seeding_from_sync_context() {
        let db = tokio_test::block_on(seeded_database(seed_base_date()));
        assert!(!db.is_closed());
    }

    #[tokio::test]
    async fn test_seeded_database_has_doctors() {
        let db = seeded_database(seed_base_date()).await;
        db.ping().await.unwrap();
    }
}
