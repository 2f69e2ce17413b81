use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use foodstats_core::catalog;
use foodstats_core::nutrition::{Ingredient, NutritionTotals, TemplateIngredient};
use serde::Deserialize;
use utoipa::IntoParams;

use super::MessageResponse;
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery, require_param};
use crate::session::SessionId;
use crate::state::AppState;

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/api/addingredient", post(add_ingredient))
        .route("/api/deleteingredient", delete(delete_ingredient))
        .route("/api/reset", delete(reset_ingredients))
}

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/api/ingredients", get(list_ingredients))
        .route("/api/calculate", get(calculate))
        .route("/api/suggestions", get(suggestions))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NameQuery {
    /// Ingredient name, matched case-insensitively
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SuggestionQuery {
    /// Name prefix
    pub query: Option<String>,
}

/// Add an ingredient to the session's working list
///
/// The name is resolved against the catalog and nutrients are scaled from
/// per-100g values to the requested grams.
#[utoipa::path(
    post,
    path = "/api/addingredient",
    request_body = TemplateIngredient,
    responses(
        (status = 201, description = "Ingredient added", body = Ingredient),
        (status = 400, description = "Empty name or grams <= 0", body = foodstats_core::error::ApiError),
        (status = 404, description = "Unknown ingredient", body = foodstats_core::error::ApiError),
        (status = 409, description = "Ingredient already added", body = foodstats_core::error::ApiError)
    ),
    tag = "ingredients"
)]
pub async fn add_ingredient(
    State(state): State<AppState>,
    session: SessionId,
    AppJson(template): AppJson<TemplateIngredient>,
) -> Result<(StatusCode, Json<Ingredient>), AppError> {
    let ingredient = state
        .ledger
        .add(session.as_str(), template, state.ingredients.as_ref())
        .await?;
    tracing::info!(
        session_id = %session.as_str(),
        ingredient = %ingredient.name,
        grams = ingredient.grams,
        "ingredient added"
    );
    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// List the session's ingredients, sorted by name
#[utoipa::path(
    get,
    path = "/api/ingredients",
    responses((status = 200, description = "Current ingredients", body = Vec<Ingredient>)),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    session: SessionId,
) -> Json<Vec<Ingredient>> {
    Json(state.ledger.list(session.as_str()))
}

/// Sum the session's ingredients into nutrition totals
#[utoipa::path(
    get,
    path = "/api/calculate",
    responses((status = 200, description = "Totals labelled \"Your recipe\"", body = NutritionTotals)),
    tag = "ingredients"
)]
pub async fn calculate(State(state): State<AppState>, session: SessionId) -> Json<NutritionTotals> {
    Json(state.ledger.totals(session.as_str()))
}

/// Remove one ingredient by name; removing an absent name is not an error
#[utoipa::path(
    delete,
    path = "/api/deleteingredient",
    params(NameQuery),
    responses(
        (status = 200, description = "Ingredient deleted", body = MessageResponse),
        (status = 400, description = "Missing name parameter", body = foodstats_core::error::ApiError)
    ),
    tag = "ingredients"
)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    session: SessionId,
    AppQuery(query): AppQuery<NameQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let name = require_param(query.name, "name")?;
    let removed = state.ledger.remove(session.as_str(), &name);
    tracing::debug!(session_id = %session.as_str(), ingredient = %name, removed, "ingredient delete");
    Ok(Json(MessageResponse::new("Ingredient deleted.")))
}

/// Clear the session's working list
#[utoipa::path(
    delete,
    path = "/api/reset",
    responses((status = 200, description = "List cleared", body = MessageResponse)),
    tag = "ingredients"
)]
pub async fn reset_ingredients(
    State(state): State<AppState>,
    session: SessionId,
) -> Json<MessageResponse> {
    state.ledger.reset(session.as_str());
    Json(MessageResponse::new("Ingredient list reset."))
}

/// Autocomplete catalog ingredient names by prefix
#[utoipa::path(
    get,
    path = "/api/suggestions",
    params(SuggestionQuery),
    responses(
        (status = 200, description = "Matching names, sorted", body = Vec<String>),
        (status = 400, description = "Missing query parameter", body = foodstats_core::error::ApiError)
    ),
    tag = "ingredients"
)]
pub async fn suggestions(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SuggestionQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let query = require_param(query.query, "query")?;
    let names = catalog::suggest_names(state.ingredients.as_ref(), &query).await?;
    Ok(Json(names))
}
