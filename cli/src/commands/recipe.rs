use clap::Subcommand;
use serde_json::json;

use crate::util::{api_request, exit_error, read_json_from_file};

#[derive(Subcommand)]
pub enum RecipeCommands {
    /// List all recipes
    List,
    /// Show one recipe by exact name
    Get {
        name: String,
    },
    /// Add a recipe to the catalog
    Add {
        /// Recipe name
        #[arg(long, required_unless_present = "file")]
        name: Option<String>,
        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
        /// Ingredient as NAME=GRAMS (repeatable), e.g. --ingredient oats=60
        #[arg(long = "ingredient", value_parser = parse_ingredient)]
        ingredients: Vec<(String, f64)>,
        /// Mark the recipe as vegan
        #[arg(long)]
        vegan: bool,
        /// Read the full recipe JSON from file (use '-' for stdin)
        #[arg(long, short = 'f', conflicts_with_all = ["name", "ingredients"])]
        file: Option<String>,
    },
    /// Recipes ranked by overlap with the session's ingredients
    Suggest,
}

pub async fn run(api_url: &str, session_id: &str, command: RecipeCommands) -> i32 {
    match command {
        RecipeCommands::List => {
            api_request(api_url, reqwest::Method::GET, "/api/listrecipes", session_id, None, &[]).await
        }
        RecipeCommands::Get { name } => {
            api_request(
                api_url,
                reqwest::Method::GET,
                "/api/getrecipe",
                session_id,
                None,
                &[("name", name.as_str())],
            )
            .await
        }
        RecipeCommands::Add {
            name,
            description,
            ingredients,
            vegan,
            file,
        } => {
            let body = match file {
                Some(path) => read_json_from_file(&path).unwrap_or_else(|e| exit_error(&e, None)),
                None => draft_body(name.unwrap_or_default(), &description, &ingredients, vegan),
            };
            api_request(api_url, reqwest::Method::POST, "/api/addrecipe", session_id, Some(body), &[])
                .await
        }
        RecipeCommands::Suggest => {
            api_request(api_url, reqwest::Method::GET, "/api/suggestrecipes", session_id, None, &[])
                .await
        }
    }
}

fn draft_body(name: String, description: &str, ingredients: &[(String, f64)], vegan: bool) -> serde_json::Value {
    let ingredients: Vec<serde_json::Value> = ingredients
        .iter()
        .map(|(name, grams)| json!({"name": name, "grams": grams}))
        .collect();
    json!({
        "name": name,
        "description": description,
        "ingredients": ingredients,
        "vegan": vegan
    })
}

fn parse_ingredient(raw: &str) -> Result<(String, f64), String> {
    let (name, grams) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=GRAMS, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing ingredient name in '{raw}'"));
    }
    let grams: f64 = grams
        .trim()
        .parse()
        .map_err(|_| format!("invalid grams in '{raw}'"))?;
    Ok((name.to_string(), grams))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ingredient_splits_on_last_equals() {
        assert_eq!(parse_ingredient("oats=60").unwrap(), ("oats".to_string(), 60.0));
        assert_eq!(
            parse_ingredient(" olive oil = 12.5 ").unwrap(),
            ("olive oil".to_string(), 12.5)
        );
        assert!(parse_ingredient("oats").is_err());
        assert!(parse_ingredient("=60").is_err());
        assert!(parse_ingredient("oats=lots").is_err());
    }

    #[test]
    fn draft_body_has_wire_shape() {
        let body = draft_body(
            "Porridge".to_string(),
            "Warm",
            &[("oats".to_string(), 60.0), ("milk".to_string(), 250.0)],
            false,
        );
        assert_eq!(
            body,
            json!({
                "name": "Porridge",
                "description": "Warm",
                "ingredients": [{"name": "oats", "grams": 60.0}, {"name": "milk", "grams": 250.0}],
                "vegan": false
            })
        );
    }
}
