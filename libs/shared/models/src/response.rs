use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// One page of a filtered listing plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Validated `limit`/`offset` pair for listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn parse(limit: Option<i64>, offset: Option<i64>) -> Result<Self, String> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(format!("Limit must be between 1 and {}", MAX_PAGE_LIMIT));
        }

        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err("Offset must not be negative".to_string());
        }

        Ok(Self { limit, offset })
    }
}

/// The `{success, data|message, count?, total?, hasMore?}` envelope every
/// endpoint answers with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            count: None,
            total: None,
            has_more: None,
            status: StatusCode::OK,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn page(page: Page<T>, offset: i64) -> Self {
        let count = page.items.len();
        let has_more = offset + (count as i64) < page.total;

        Self {
            count: Some(count),
            total: Some(page.total),
            has_more: Some(has_more),
            ..Self::ok(page.items)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_envelope_reports_has_more() {
        let response = ApiResponse::page(Page { items: vec![1, 2], total: 5 }, 0);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            json!({ "success": true, "data": [1, 2], "count": 2, "total": 5, "hasMore": true })
        );
    }

    #[test]
    fn test_last_page_has_no_more() {
        let response = ApiResponse::page(Page { items: vec![5], total: 5 }, 4);
        assert_eq!(response.has_more, Some(false));
    }

    #[test]
    fn test_pagination_bounds() {
        assert_eq!(Pagination::parse(None, None).unwrap(), Pagination::default());
        assert_eq!(
            Pagination::parse(Some(100), Some(20)).unwrap(),
            Pagination { limit: 100, offset: 20 }
        );
        assert!(Pagination::parse(Some(0), None).is_err());
        assert!(Pagination::parse(Some(101), None).is_err());
        assert!(Pagination::parse(None, Some(-1)).is_err());
    }

    #[test]
    fn test_created_with_message() {
        let response = ApiResponse::created("x").with_message("Appointment booked successfully");
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "Appointment booked successfully");
        assert!(json.get("count").is_none());
    }
}
