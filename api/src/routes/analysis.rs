use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use foodstats_core::analysis::{AnalysisOutcome, NutritionAnalysis};
use foodstats_core::nutrition::Ingredient;

use crate::extract::AppJson;
use crate::session::SessionId;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/analyzenutrition", post(analyze_nutrition))
}

/// Score a list of already-scaled ingredients
///
/// Personalised with the session's saved profile when one exists. If the
/// analyzer is unavailable the response is still 200: `health_score`,
/// `nutrient_balance`, `nutrient_scores` and `metrics_breakdown` are null and
/// a `totals` block carries the locally summed nutrients.
#[utoipa::path(
    post,
    path = "/api/analyzenutrition",
    request_body = Vec<Ingredient>,
    responses(
        (status = 200, description = "Enriched or degraded analysis", body = NutritionAnalysis),
        (status = 400, description = "Body is not an ingredient list", body = foodstats_core::error::ApiError)
    ),
    tag = "analysis"
)]
pub async fn analyze_nutrition(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(ingredients): AppJson<Vec<Ingredient>>,
) -> Json<AnalysisOutcome> {
    let profile = state.profiles.get(session.as_str());
    let outcome = state.analysis.analyze(&ingredients, profile.as_ref()).await;
    tracing::info!(
        session_id = %session.as_str(),
        ingredients = ingredients.len(),
        personalized = profile.is_some(),
        degraded = outcome.is_degraded(),
        "nutrition analyzed"
    );
    Json(outcome)
}
