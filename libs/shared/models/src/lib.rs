pub mod error;
pub mod response;

pub use error::{AppError, ErrorDetail};
pub use response::{ApiResponse, Page, Pagination};
