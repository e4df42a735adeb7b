pub mod aggregator;
pub mod refresher;

pub use aggregator::AnalyticsService;
pub use refresher::AnalyticsRefresher;
