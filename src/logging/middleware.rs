use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::keystore::fingerprint;
use crate::utils::header_utils::{extract_api_key, extract_client_ip};

/// Request ID wrapper for tracking requests through the system
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Settings consulted by the access log middleware
#[derive(Clone, Debug)]
pub struct AccessLogSettings {
    pub slow_request_threshold: Duration,
    /// Log the forwarded client address instead of the peer
    pub trust_proxy: bool,
}

impl Default for AccessLogSettings {
    fn default() -> Self {
        Self {
            slow_request_threshold: Duration::from_secs(5),
            trust_proxy: false,
        }
    }
}

/// Middleware to generate unique request IDs for correlation
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-ID", header_value);
    }

    response
}

/// Middleware to log all HTTP requests to the access log
pub async fn access_log_middleware(
    State(settings): State<AccessLogSettings>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let client_ip = extract_client_ip(&req, settings.trust_proxy)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Never log the key itself
    let api_key_hash = extract_api_key(req.headers()).map(|key| fingerprint(&key));

    let response = next.run(req).await;

    let status = response.status();
    let duration = start.elapsed();

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::info!(
        target: "access_log",
        request_id = %request_id,
        client_ip = %client_ip,
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        user_agent = %user_agent,
        api_key_hash = ?api_key_hash,
        content_type = %content_type,
        "HTTP request completed"
    );

    if duration > settings.slow_request_threshold {
        tracing::warn!(
            request_id = %request_id,
            path = %path,
            duration_ms = duration.as_millis() as u64,
            threshold_ms = settings.slow_request_threshold.as_millis() as u64,
            "Slow request detected"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(middleware::from_fn_with_state(
                AccessLogSettings::default(),
                access_log_middleware,
            ))
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response.headers().get("X-Request-ID").unwrap().to_str().unwrap().to_string();
        assert_eq!(header.len(), 36);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, header.as_bytes());
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("X-Request-ID", "client-id-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("X-Request-ID").unwrap(), "client-id-42");
    }

    #[test]
    fn test_request_id_wrapper() {
        let id = RequestId("test-id-123".to_string());
        let id_clone = id.clone();
        assert_eq!(id_clone.0, "test-id-123");
    }

    #[test]
    fn test_default_settings() {
        let settings = AccessLogSettings::default();
        assert_eq!(settings.slow_request_threshold, Duration::from_secs(5));
        assert!(!settings.trust_proxy);
    }
}
