//! Service middleware for access logging, metrics and CORS.
//!
//! ## Log targets
//!
//! - `json_uplift_service::access` - one line per request with trace id, status and latency
//! - `json_uplift::metrics` - one `uplift_metric` line per successful uplift

use std::time::Instant;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::{info, info_span, warn, Instrument};

use crate::config::CorsOrigins;
use crate::types::OutputKind;

/// Request logging middleware that adds a trace id and timing.
///
/// The trace id comes from `X-Cloud-Trace-Context` when present, otherwise a
/// fresh UUID v4.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let trace_id = request
        .headers()
        .get("X-Cloud-Trace-Context")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split('/').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "request",
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    span.record("status", status);
    span.record("latency_ms", latency_ms);

    info!(
        target: "json_uplift_service::access",
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = status,
        latency_ms = latency_ms,
        "request completed"
    );

    response
}

/// Record a successful uplift.
pub fn record_uplift_metric(output: OutputKind, bytes: usize, latency_ms: u64) {
    info!(
        target: "json_uplift::metrics",
        metric_type = "uplift",
        output = output.as_str(),
        bytes = bytes,
        latency_ms = latency_ms,
        "uplift_metric"
    );
}

/// CORS layer for the configured origins.
///
/// Any origin: no credentials. Explicit origins: credentials allowed, request
/// method and headers mirrored back.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "Ignoring unusable CORS origin");
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(values))
                .allow_credentials(true)
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{self, header}, routing::get, Router};
    use tower::ServiceExt;

    fn app(origins: CorsOrigins) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_logging_middleware))
            .layer(cors_layer(&origins))
    }

    fn request(origin: &str) -> http::Request<Body> {
        http::Request::builder()
            .uri("/")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_any_origin_without_credentials() {
        let response = app(CorsOrigins::Any).oneshot(request("https://a.org")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[tokio::test]
    async fn test_listed_origin_with_credentials() {
        let origins = CorsOrigins::List(vec!["https://a.org".into()]);
        let response = app(origins).oneshot(request("https://a.org")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.org");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_header() {
        let origins = CorsOrigins::List(vec!["https://a.org".into()]);
        let response = app(origins).oneshot(request("https://b.org")).await.unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
