use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use foodstats_core::profile::UserProfile;
use serde::Serialize;
use utoipa::ToSchema;

use super::StatusResponse;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::session::SessionId;
use crate::state::AppState;

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/api/saveprofile", post(save_profile))
        .route("/api/resetprofile", delete(reset_profile))
}

pub fn read_router() -> Router<AppState> {
    Router::new().route("/api/getprofile", get(get_profile))
}

/// The stored profile, or `{"status": "no_profile"}`.
#[derive(Serialize, ToSchema)]
#[serde(untagged)]
pub enum ProfileResponse {
    Found(UserProfile),
    Missing(StatusResponse),
}

/// Save the session's profile, replacing any previous one
///
/// Used to personalise nutrition analysis. Ranges: age 1-120, weight 20-300 kg,
/// height 100-250 cm.
#[utoipa::path(
    post,
    path = "/api/saveprofile",
    request_body = UserProfile,
    responses(
        (status = 200, description = "Profile saved", body = StatusResponse),
        (status = 400, description = "Out-of-range value", body = foodstats_core::error::ApiError)
    ),
    tag = "profile"
)]
pub async fn save_profile(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(profile): AppJson<UserProfile>,
) -> Result<Json<StatusResponse>, AppError> {
    state.profiles.save(session.as_str(), profile)?;
    tracing::debug!(session_id = %session.as_str(), "profile saved");
    Ok(Json(StatusResponse::new("success")))
}

#[utoipa::path(
    get,
    path = "/api/getprofile",
    responses((status = 200, description = "Profile or no_profile marker", body = ProfileResponse)),
    tag = "profile"
)]
pub async fn get_profile(State(state): State<AppState>, session: SessionId) -> Json<ProfileResponse> {
    Json(match state.profiles.get(session.as_str()) {
        Some(profile) => ProfileResponse::Found(profile),
        None => ProfileResponse::Missing(StatusResponse::new("no_profile")),
    })
}

#[utoipa::path(
    delete,
    path = "/api/resetprofile",
    responses((status = 200, description = "Profile removed", body = StatusResponse)),
    tag = "profile"
)]
pub async fn reset_profile(State(state): State<AppState>, session: SessionId) -> Json<StatusResponse> {
    state.profiles.reset(session.as_str());
    Json(StatusResponse::new("success"))
}
