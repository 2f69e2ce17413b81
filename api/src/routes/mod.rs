pub mod analysis;
pub mod health;
pub mod ingredients;
pub mod profile;
pub mod recipes;
pub mod recommendations;

use axum::Router;
use serde::Serialize;
use utoipa::ToSchema;

use crate::middleware::rate_limit;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

/// Every API route. Each rate-limit class is one layer over all its routes,
/// so a client has a single write budget, a single read budget and a single
/// analysis budget.
pub fn api_router() -> Router<AppState> {
    let writes = Router::new()
        .merge(ingredients::write_router())
        .merge(recipes::write_router())
        .merge(profile::write_router())
        .layer(rate_limit::write_layer());
    let reads = Router::new()
        .merge(ingredients::read_router())
        .merge(recipes::read_router())
        .merge(profile::read_router())
        .layer(rate_limit::read_layer());
    let analysis = Router::new()
        .merge(analysis::router())
        .merge(recommendations::router())
        .layer(rate_limit::analysis_layer());

    Router::new()
        .merge(health::router())
        .merge(writes)
        .merge(reads)
        .merge(analysis)
}
