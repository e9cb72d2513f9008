//! Request/response logging.
//!
//! One span per request keyed by the correlation id; the outcome is logged at
//! a level that follows the status class.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Instrument, Level, info, info_span, warn};

use super::RequestId;

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id
    );

    async move {
        info!("Request received");

        let start = Instant::now();
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        match outcome_level(status) {
            Level::WARN => warn!(status, duration_ms, "Response sent"),
            _ => info!(status, duration_ms, "Response sent"),
        }

        response
    }
    .instrument(span)
    .await
}

/// Server errors are already logged with their cause by the error mapper.
fn outcome_level(status: u16) -> Level {
    match status {
        400..=499 => Level::WARN,
        _ => Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_level() {
        assert_eq!(outcome_level(200), Level::INFO);
        assert_eq!(outcome_level(201), Level::INFO);
        assert_eq!(outcome_level(404), Level::WARN);
        assert_eq!(outcome_level(409), Level::WARN);
        assert_eq!(outcome_level(503), Level::INFO);
    }
}
