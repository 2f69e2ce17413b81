use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/api/health", get(health_check))
}

#[derive(Serialize, ToSchema)]
pub struct BannerResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// `ok` or `error`
    pub db: String,
    pub time: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "API is running", body = BannerResponse)),
    tag = "system"
)]
pub async fn banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        status: "ok".to_string(),
        message: "FoodStats API is running".to_string(),
    })
}

/// Health check endpoint: reports API liveness and catalog reachability
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Catalog unreachable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = match state.ingredients.ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "catalog health check failed");
            false
        }
    };

    let http_status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if db_ok { "ok" } else { "degraded" }.to_string(),
            db: if db_ok { "ok" } else { "error" }.to_string(),
            time: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
