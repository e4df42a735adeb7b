// =====================================================================================
// MONITORING CELL - SERVICE HEALTH
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{DatabaseHealth, HealthReport, HealthStats, MonitoringError};
pub use router::health_routes;
pub use services::HealthMonitorService;
