use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use foodstats_core::catalog::{Recipe, RecipeDraft};
use foodstats_core::matcher::{self, RecipeSuggestion};
use serde::Deserialize;
use utoipa::IntoParams;

use super::MessageResponse;
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery, require_param};
use crate::session::SessionId;
use crate::state::AppState;

pub fn write_router() -> Router<AppState> {
    Router::new().route("/api/addrecipe", post(add_recipe))
}

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/api/listrecipes", get(list_recipes))
        .route("/api/getrecipe", get(get_recipe))
        .route("/api/suggestrecipes", get(suggest_recipes))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecipeQuery {
    /// Exact recipe name
    pub name: Option<String>,
}

/// List every recipe, ordered by name
#[utoipa::path(
    get,
    path = "/api/listrecipes",
    responses(
        (status = 200, description = "All recipes", body = Vec<Recipe>),
        (status = 500, description = "Catalog unavailable", body = foodstats_core::error::ApiError)
    ),
    tag = "recipes"
)]
pub async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, AppError> {
    Ok(Json(state.recipes.list_recipes().await?))
}

#[utoipa::path(
    get,
    path = "/api/getrecipe",
    params(RecipeQuery),
    responses(
        (status = 200, description = "Recipe found", body = Recipe),
        (status = 400, description = "Missing name parameter", body = foodstats_core::error::ApiError),
        (status = 404, description = "Recipe not found", body = foodstats_core::error::ApiError)
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RecipeQuery>,
) -> Result<Json<Recipe>, AppError> {
    let name = require_param(query.name, "name")?;
    Ok(Json(state.recipes.get_recipe(&name).await?))
}

/// Add a recipe to the shared catalog
///
/// Names allow letters, digits, spaces and `- . , ( )` up to 100 characters.
/// Each ingredient needs grams in (0, 10000]. The description is trimmed and
/// HTML-escaped, and must stay within 500 characters.
#[utoipa::path(
    post,
    path = "/api/addrecipe",
    request_body = RecipeDraft,
    responses(
        (status = 201, description = "Recipe added", body = MessageResponse),
        (status = 400, description = "Validation failed", body = foodstats_core::error::ApiError),
        (status = 409, description = "Recipe name already taken", body = foodstats_core::error::ApiError)
    ),
    tag = "recipes"
)]
pub async fn add_recipe(
    State(state): State<AppState>,
    AppJson(draft): AppJson<RecipeDraft>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let recipe = state.recipes.add_recipe(draft).await?;
    tracing::info!(recipe = %recipe.name, recipe_id = recipe.id, "recipe added");
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Recipe added"))))
}

/// Rank recipes by how many of their ingredients the session already has
///
/// Recipes with no overlap are omitted. Ties keep catalog (name) order.
#[utoipa::path(
    get,
    path = "/api/suggestrecipes",
    responses(
        (status = 200, description = "Ranked suggestions", body = Vec<RecipeSuggestion>),
        (status = 500, description = "Catalog unavailable", body = foodstats_core::error::ApiError)
    ),
    tag = "recipes"
)]
pub async fn suggest_recipes(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<Vec<RecipeSuggestion>>, AppError> {
    let names = state.ledger.ingredient_names(session.as_str());
    if names.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let recipes = state.recipes.list_recipes().await?;
    Ok(Json(matcher::rank_recipes(&names, recipes)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::routes::ingredients;
    use crate::state::test_support::{request, send, state};

    fn app(state: AppState) -> Router {
        write_router()
            .merge(read_router())
            .merge(ingredients::write_router())
            .with_state(state)
    }

    #[tokio::test]
    async fn lists_and_gets_recipes() {
        let (status, body) = send(app(state()), request("GET", "/api/listrecipes", "s1", None)).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Omelette", "Pancakes", "Shortbread"]);

        let (status, body) = send(app(state()), request("GET", "/api/getrecipe?name=Pancakes", "s1", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ingredients"][0], json!({"name": "flour", "grams": 120.0}));

        let (status, body) = send(app(state()), request("GET", "/api/getrecipe?name=Stew", "s1", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(app(state()), request("GET", "/api/getrecipe", "s1", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_recipe_validates_and_rejects_duplicates() {
        let state = state();
        let draft = json!({
            "name": "Scrambled eggs",
            "description": "  Soft <b>curds</b>  ",
            "ingredients": [{"name": "egg", "grams": 120}, {"name": "butter", "grams": 10}]
        });

        let (status, body) = send(app(state.clone()), request("POST", "/api/addrecipe", "s1", Some(draft.clone()))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Recipe added");

        let (_, stored) = send(
            app(state.clone()),
            request("GET", "/api/getrecipe?name=Scrambled%20eggs", "s1", None),
        )
        .await;
        let description = stored["description"].as_str().unwrap();
        assert!(description.starts_with("Soft "));
        assert!(!description.contains('<'));

        let (status, _) = send(app(state.clone()), request("POST", "/api/addrecipe", "s1", Some(draft))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            app(state.clone()),
            request(
                "POST",
                "/api/addrecipe",
                "s1",
                Some(json!({"name": "Toast<script>", "ingredients": [{"name": "bread", "grams": 50}]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "name");

        let (status, body) = send(
            app(state),
            request(
                "POST",
                "/api/addrecipe",
                "s1",
                Some(json!({"name": "Giant loaf", "ingredients": [{"name": "flour", "grams": 10001}]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "ingredients.grams");
    }

    #[tokio::test]
    async fn suggestions_rank_by_overlap() {
        let state = state();
        for name in ["egg", "milk"] {
            send(
                app(state.clone()),
                request("POST", "/api/addingredient", "s1", Some(json!({"name": name, "grams": 100}))),
            )
            .await;
        }

        let (status, body) = send(app(state.clone()), request("GET", "/api/suggestrecipes", "s1", None)).await;
        assert_eq!(status, StatusCode::OK);
        let ranked: Vec<(String, u64, u64)> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| {
                (
                    s["name"].as_str().unwrap().to_string(),
                    s["matches"].as_u64().unwrap(),
                    s["total"].as_u64().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            ranked,
            vec![("Omelette".to_string(), 2, 2), ("Pancakes".to_string(), 2, 3)]
        );

        let (_, empty) = send(app(state), request("GET", "/api/suggestrecipes", "other", None)).await;
        assert_eq!(empty, json!([]));
    }
}
