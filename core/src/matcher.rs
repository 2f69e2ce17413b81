use std::collections::HashSet;

use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::Recipe;

/// A recipe together with how many of its ingredients the session already has.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecipeSuggestion {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub matches: usize,
    pub total: usize,
}

/// Rank `recipes` by overlap with `session_names` (lower-cased).
///
/// Recipes with no overlap are dropped. The sort is stable, so recipes with
/// equal `matches` keep the order they arrived in (catalog order, by name).
pub fn rank_recipes(session_names: &HashSet<String>, recipes: Vec<Recipe>) -> Vec<RecipeSuggestion> {
    let mut suggestions: Vec<RecipeSuggestion> = recipes
        .into_iter()
        .filter_map(|recipe| {
            let matches = recipe
                .ingredients
                .iter()
                .filter(|ingredient| session_names.contains(&ingredient.name.to_lowercase()))
                .count();
            if matches == 0 {
                return None;
            }
            let total = recipe.ingredients.len();
            Some(RecipeSuggestion {
                recipe,
                matches,
                total,
            })
        })
        .collect();
    suggestions.sort_by(|a, b| b.matches.cmp(&a.matches));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::TemplateIngredient;

    fn recipe(id: i64, name: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            id,
            name: name.to_string(),
            description: String::new(),
            ingredients: ingredients
                .iter()
                .map(|name| TemplateIngredient {
                    name: name.to_string(),
                    grams: 100.0,
                })
                .collect(),
            vegan: false,
        }
    }

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ranks_by_overlap() {
        let recipes = vec![recipe(1, "R1", &["a", "b", "c"]), recipe(2, "R2", &["a"])];
        let ranked = rank_recipes(&names(&["a", "b"]), recipes);

        let summary: Vec<(&str, usize, usize)> = ranked
            .iter()
            .map(|s| (s.recipe.name.as_str(), s.matches, s.total))
            .collect();
        assert_eq!(summary, vec![("R1", 2, 3), ("R2", 1, 1)]);
    }

    #[test]
    fn drops_recipes_without_overlap() {
        let recipes = vec![
            recipe(1, "Curry", &["lentils", "rice"]),
            recipe(2, "Salad", &["lettuce", "tomato"]),
        ];
        let ranked = rank_recipes(&names(&["rice"]), recipes);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].recipe.name, "Curry");
        assert!(rank_recipes(&HashSet::new(), vec![recipe(3, "Toast", &["bread"])]).is_empty());
    }

    #[test]
    fn recipe_ingredient_names_compare_case_insensitively() {
        let ranked = rank_recipes(&names(&["egg"]), vec![recipe(1, "Omelette", &["Egg", "Milk"])]);
        assert_eq!(ranked[0].matches, 1);
        assert_eq!(ranked[0].total, 2);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let recipes = vec![
            recipe(1, "Apple pie", &["apple", "flour"]),
            recipe(2, "Banana bread", &["banana", "flour", "egg"]),
            recipe(3, "Crepes", &["flour", "egg"]),
            recipe(4, "Dumplings", &["flour"]),
        ];
        let ranked = rank_recipes(&names(&["flour", "egg"]), recipes);
        let order: Vec<&str> = ranked.iter().map(|s| s.recipe.name.as_str()).collect();
        assert_eq!(order, vec!["Banana bread", "Crepes", "Apple pie", "Dumplings"]);
    }

    #[test]
    fn suggestion_serializes_recipe_fields_inline() {
        let ranked = rank_recipes(&names(&["a"]), vec![recipe(7, "R", &["a", "b"])]);
        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(json["name"], "R");
        assert_eq!(json["id"], 7);
        assert_eq!(json["matches"], 1);
        assert_eq!(json["total"], 2);
    }
}
