use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use foodstats_core::recommend::{self, NO_INGREDIENTS_MESSAGE, RecipeRecommendation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::session::SessionId;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/smartrecommendations", post(smart_recommendations))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecommendationRequest {
    /// Ingredient names the client has on hand
    #[serde(default)]
    pub ingredients: Vec<String>,
}

/// Either the recommended recipes or, when no ingredient was named, a plain
/// JSON string explaining that nothing could be recommended.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RecommendationResponse {
    Recipes(Vec<RecipeRecommendation>),
    Message(String),
}

/// Recipes similar to a set of ingredient names
///
/// Ranked by the external recommender. Blank names are ignored; a request
/// with none left gets `"Failed to get recommendations!"` with status 200.
/// Recommender failures are reported as 500.
#[utoipa::path(
    post,
    path = "/api/smartrecommendations",
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Recommended recipes, or a message when no ingredients were sent", body = RecommendationResponse),
        (status = 400, description = "Body is not {\"ingredients\": [string]}", body = foodstats_core::error::ApiError),
        (status = 500, description = "Recommender unavailable", body = foodstats_core::error::ApiError)
    ),
    tag = "analysis"
)]
pub async fn smart_recommendations(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(req): AppJson<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let names = recommend::normalize_names(&req.ingredients);
    if names.is_empty() {
        return Ok(Json(RecommendationResponse::Message(
            NO_INGREDIENTS_MESSAGE.to_string(),
        )));
    }

    let recipes = state.recommendations.recommend(&names).await?;
    tracing::info!(
        session_id = %session.as_str(),
        ingredients = names.len(),
        recipes = recipes.len(),
        "recipes recommended"
    );
    Ok(Json(RecommendationResponse::Recipes(recipes)))
}
