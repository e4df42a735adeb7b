use std::env;
use std::fmt;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_DB_FILE: &str = "./niroggyan.db";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 20;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_file: String,
    pub port: u16,
    pub frontend_url: String,
    pub environment: Environment,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    /// First calendar date of the seeded doctor slot calendars.
    pub seed_base_date: NaiveDate,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_file: DEFAULT_DB_FILE.to_string(),
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            environment: Environment::Production,
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            seed_base_date: default_seed_base_date(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Missing or
    /// unparsable values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_file = lookup("DB_FILE").unwrap_or_else(|| {
            warn!("DB_FILE not set, using {}", DEFAULT_DB_FILE);
            defaults.database_file.clone()
        });

        let port = parse_or(&lookup, "PORT", defaults.port);

        let frontend_url = lookup("FRONTEND_URL").unwrap_or_else(|| {
            warn!("FRONTEND_URL not set, using {}", DEFAULT_FRONTEND_URL);
            defaults.frontend_url.clone()
        });

        let environment = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value).unwrap_or_else(|| {
                warn!("APP_ENV has unknown value '{}', using production", value);
                Environment::Production
            }),
            None => {
                warn!("APP_ENV not set, using production");
                Environment::Production
            }
        };

        let rate_limit_max_requests = parse_or(
            &lookup,
            "RATE_LIMIT_MAX_REQUESTS",
            defaults.rate_limit_max_requests,
        );
        let rate_limit_window_secs = parse_or(
            &lookup,
            "RATE_LIMIT_WINDOW_SECS",
            defaults.rate_limit_window_secs,
        );

        let seed_base_date = match lookup("SEED_BASE_DATE") {
            Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").unwrap_or_else(|_| {
                warn!("SEED_BASE_DATE '{}' is not YYYY-MM-DD, using tomorrow", value);
                defaults.seed_base_date
            }),
            None => defaults.seed_base_date,
        };

        let config = Self {
            database_file,
            port,
            frontend_url,
            environment,
            rate_limit_max_requests,
            rate_limit_window_secs,
            seed_base_date,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - invalid rate limit settings");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.database_file.is_empty()
            && self.rate_limit_max_requests > 0
            && self.rate_limit_window_secs > 0
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn default_seed_base_date() -> NaiveDate {
    Local::now().date_naive() + Duration::days(1)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(lookup_from(&[]));

        assert_eq!(config.database_file, DEFAULT_DB_FILE);
        assert_eq!(config.port, 5000);
        assert_eq!(config.frontend_url, "http://localhost:5173");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.rate_limit_max_requests, 20);
        assert_eq!(config.rate_limit_window_secs, 60);
        assert!(config.seed_base_date > Local::now().date_naive());
        assert!(config.is_configured());
    }

    #[test]
    fn test_values_read_from_lookup() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DB_FILE", "/tmp/clinic.db"),
            ("PORT", "8080"),
            ("FRONTEND_URL", "https://app.example.com"),
            ("APP_ENV", "development"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
            ("RATE_LIMIT_WINDOW_SECS", "10"),
            ("SEED_BASE_DATE", "2025-08-10"),
        ]));

        assert_eq!(config.database_file, "/tmp/clinic.db");
        assert_eq!(config.port, 8080);
        assert_eq!(config.frontend_url, "https://app.example.com");
        assert!(config.is_development());
        assert_eq!(config.rate_limit_max_requests, 5);
        assert_eq!(config.rate_limit_window_secs, 10);
        assert_eq!(
            config.seed_base_date,
            NaiveDate::from_ymd_opt(2025, 8, 10).unwrap()
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("APP_ENV", "staging"),
            ("SEED_BASE_DATE", "10/08/2025"),
        ]));

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.seed_base_date > Local::now().date_naive());
    }

    #[test]
    fn test_zero_rate_limit_is_not_configured() {
        let config = AppConfig::from_lookup(lookup_from(&[("RATE_LIMIT_MAX_REQUESTS", "0")]));
        assert!(!config.is_configured());
    }
}
