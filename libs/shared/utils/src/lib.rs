pub mod extractor;
pub mod rate_limit;
pub mod test_utils;

pub use extractor::{client_key, expose_error_details, ApiJson, ApiQuery};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
