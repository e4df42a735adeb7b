use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use shared_models::error::{AppError, ErrorDetail};

/// JSON body extractor whose rejection uses the API error envelope.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!("Rejected JSON body: {}", rejection.body_text());
                Err(AppError::BadRequest("Invalid JSON in request body".to_string()))
            }
        }
    }
}

/// Query-string extractor whose rejection uses the API error envelope.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => {
                debug!("Rejected query string: {}", rejection.body_text());
                Err(AppError::BadRequest("Invalid query parameters".to_string()))
            }
        }
    }
}

/// Identify the caller for rate limiting: socket peer address first, then
/// the first `X-Forwarded-For` hop.
pub fn client_key<B>(request: &axum::http::Request<B>) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    forwarded_for(request.headers()).unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_string)
}

/// Development-only middleware: put the unredacted failure detail of 5xx
/// responses back into the `error` field.
pub async fn expose_error_details(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    let body = Json(json!({
        "success": false,
        "message": detail.message,
        "error": detail.detail
    }));

    let mut rebuilt = body.into_response();
    *rebuilt.status_mut() = parts.status;
    rebuilt.headers_mut().extend(parts.headers);
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        #[allow(dead_code)]
        limit: Option<i64>,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", post(|ApiJson(_): ApiJson<Payload>| async { "ok" }))
            .route("/list", get(|ApiQuery(_): ApiQuery<Paging>| async { "ok" }))
            .route(
                "/boom",
                get(|| async { AppError::internal("Error fetching doctors", "disk I/O error") }),
            )
    }

    #[tokio::test]
    async fn test_malformed_json_uses_envelope() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn test_bad_query_uses_envelope() {
        let request = HttpRequest::builder()
            .uri("/list?limit=lots")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Invalid query parameters");
    }

    #[tokio::test]
    async fn test_error_details_exposed_only_with_middleware() {
        let request = || HttpRequest::builder().uri("/boom").body(Body::empty()).unwrap();

        let redacted = app().oneshot(request()).await.unwrap();
        assert_eq!(body_json(redacted).await["error"], "Internal server error");

        let exposed = app()
            .layer(middleware::from_fn(expose_error_details))
            .oneshot(request())
            .await
            .unwrap();
        assert_eq!(exposed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(exposed).await;
        assert_eq!(json["message"], "Error fetching doctors");
        assert_eq!(json["error"], "disk I/O error");
    }

    #[test]
    fn test_client_key_prefers_connect_info() {
        let mut request = HttpRequest::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.7");

        let addr: SocketAddr = "192.0.2.1:4321".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_key(&request), "192.0.2.1");

        let bare = HttpRequest::builder().body(()).unwrap();
        assert_eq!(client_key(&bare), "unknown");
    }
}
