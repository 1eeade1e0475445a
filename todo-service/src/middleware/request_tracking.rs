//! Request tracking middleware
//!
//! Request ID generation and propagation, sensitive header masking, and the
//! `X-Process-Time` response header.

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

/// Default request ID header
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Response header carrying the handling time in seconds
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Sensitive headers that should be masked in logs
pub const SENSITIVE_HEADERS: [HeaderName; 3] =
    [header::AUTHORIZATION, header::COOKIE, header::SET_COOKIE];

fn request_id_header(name: &str) -> HeaderName {
    HeaderName::try_from(name).unwrap_or_else(|_| {
        tracing::warn!(
            "Invalid request id header '{}', using {}",
            name,
            REQUEST_ID_HEADER
        );
        HeaderName::from_static(REQUEST_ID_HEADER)
    })
}

/// Create a request ID layer that generates UUID request IDs
pub fn request_id_layer(header_name: &str) -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(request_id_header(header_name), MakeRequestUuid)
}

/// Create a request ID propagation layer
pub fn request_id_propagation_layer(header_name: &str) -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(request_id_header(header_name))
}

/// Create a sensitive headers layer
pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(SENSITIVE_HEADERS)
}

/// Stamp each response with how long the service took to produce it
pub async fn process_time(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let elapsed = started.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.4}", elapsed)) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(PROCESS_TIME_HEADER), value);
    }
    tracing::debug!(%method, %path, elapsed_secs = elapsed, "Request handled");

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_invalid_header_name_falls_back() {
        assert_eq!(request_id_header("x-trace-id").as_str(), "x-trace-id");
        assert_eq!(request_id_header("not valid").as_str(), REQUEST_ID_HEADER);
    }

    #[test]
    fn test_sensitive_headers_constant() {
        assert!(SENSITIVE_HEADERS.contains(&header::AUTHORIZATION));
        assert!(SENSITIVE_HEADERS.contains(&header::COOKIE));
    }

    #[tokio::test]
    async fn test_process_time_header() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(process_time));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let value = response.headers().get(PROCESS_TIME_HEADER).unwrap();
        let secs: f64 = value.to_str().unwrap().parse().unwrap();
        assert!(secs >= 0.0);
    }

    #[tokio::test]
    async fn test_request_id_is_set_and_propagated() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(request_id_propagation_layer(REQUEST_ID_HEADER))
            .layer(request_id_layer(REQUEST_ID_HEADER));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }
}
