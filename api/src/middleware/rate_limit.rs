use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode};
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::{GovernorConfig, GovernorConfigBuilder},
    key_extractor::SmartIpKeyExtractor,
};

use foodstats_core::error::codes;

type RateLimitLayer = GovernorLayer<SmartIpKeyExtractor, governor::middleware::NoOpMiddleware, Body>;
type RateLimitConfig = GovernorConfig<SmartIpKeyExtractor, governor::middleware::NoOpMiddleware>;

/// Ledger and catalog writes: 60 requests/minute per IP.
pub fn write_layer() -> RateLimitLayer {
    layer(
        GovernorConfigBuilder::default()
            .per_second(1) // 60 per minute = 1 per second replenish
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish(),
        "write",
    )
}

/// Reads: 120 requests/minute per IP.
pub fn read_layer() -> RateLimitLayer {
    layer(
        GovernorConfigBuilder::default()
            .per_millisecond(500) // 120 per minute = 2 per second replenish
            .burst_size(30)
            .key_extractor(SmartIpKeyExtractor)
            .finish(),
        "read",
    )
}

/// Nutrition analysis spawns a process per call: 20 requests/minute per IP.
pub fn analysis_layer() -> RateLimitLayer {
    layer(
        GovernorConfigBuilder::default()
            .per_second(3) // 20 per minute = 1 per 3 seconds replenish
            .burst_size(5)
            .key_extractor(SmartIpKeyExtractor)
            .finish(),
        "analysis",
    )
}

fn layer(config: Option<RateLimitConfig>, name: &str) -> RateLimitLayer {
    let config = config.unwrap_or_else(|| panic!("invalid governor config for {name}"));
    GovernorLayer::new(config).error_handler(json_error_handler)
}

/// Returns JSON in ApiError format with a Retry-After header.
fn json_error_handler(err: GovernorError) -> Response<Body> {
    let (status, retry_after, message) = match err {
        GovernorError::TooManyRequests { wait_time, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            Some(wait_time),
            format!("Too many requests. Retry after {wait_time} seconds."),
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            "Unable to determine client identity for rate limiting".to_string(),
        ),
        GovernorError::Other { code, msg, .. } => (code, None, msg.unwrap_or_default()),
    };

    let request_id = uuid::Uuid::now_v7().to_string();
    let body = serde_json::json!({
        "error": codes::RATE_LIMITED,
        "message": message,
        "request_id": request_id,
    });

    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    if let Some(wait_time) = retry_after {
        headers.insert("retry-after", HeaderValue::from(wait_time));
    }
    response
}
