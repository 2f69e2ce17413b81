use clap::Subcommand;
use serde_json::json;

use crate::util::{api_request, exit_error};

#[derive(Subcommand)]
pub enum IngredientCommands {
    /// Add a catalog ingredient to the session's list
    Add {
        /// Ingredient name (case-insensitive)
        name: String,
        /// Amount in grams
        #[arg(long, short = 'g')]
        grams: f64,
    },
    /// List the session's ingredients
    List,
    /// Remove an ingredient by name
    Remove {
        name: String,
    },
    /// Clear the session's list
    Reset,
    /// Show summed nutrition for the session's list
    Totals,
}

pub async fn run(api_url: &str, session_id: &str, command: IngredientCommands) -> i32 {
    match command {
        IngredientCommands::Add { name, grams } => add(api_url, session_id, &name, grams).await,
        IngredientCommands::List => {
            api_request(api_url, reqwest::Method::GET, "/api/ingredients", session_id, None, &[]).await
        }
        IngredientCommands::Remove { name } => {
            api_request(
                api_url,
                reqwest::Method::DELETE,
                "/api/deleteingredient",
                session_id,
                None,
                &[("name", name.as_str())],
            )
            .await
        }
        IngredientCommands::Reset => {
            api_request(api_url, reqwest::Method::DELETE, "/api/reset", session_id, None, &[]).await
        }
        IngredientCommands::Totals => {
            api_request(api_url, reqwest::Method::GET, "/api/calculate", session_id, None, &[]).await
        }
    }
}

async fn add(api_url: &str, session_id: &str, name: &str, grams: f64) -> i32 {
    if !(grams.is_finite() && grams > 0.0) {
        exit_error(
            &format!("--grams must be greater than zero, got {grams}"),
            Some("Example: foodstats ingredient add egg --grams 50"),
        );
    }
    api_request(
        api_url,
        reqwest::Method::POST,
        "/api/addingredient",
        session_id,
        Some(json!({"name": name, "grams": grams})),
        &[],
    )
    .await
}

/// Autocomplete catalog ingredient names.
pub async fn suggest(api_url: &str, session_id: &str, query: &str) -> i32 {
    api_request(
        api_url,
        reqwest::Method::GET,
        "/api/suggestions",
        session_id,
        None,
        &[("query", query)],
    )
    .await
}
