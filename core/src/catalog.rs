use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{LazyLock, PoisonError, RwLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::nutrition::{NutrientFacts, TemplateIngredient};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_RECIPE_GRAMS: f64 = 10_000.0;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9\s\-\.,()]+$").expect("name pattern is a valid regex")
});

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid {field}: {message}")]
    Invalid { field: String, message: String },
    #[error("recipe '{0}' already exists")]
    Duplicate(String),
    #[error("catalog unavailable: {0}")]
    Storage(String),
}

/// A stored recipe. `name` is unique across the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<TemplateIngredient>,
    #[serde(default)]
    pub vegan: bool,
}

/// A recipe submitted for insertion, before catalog validation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<TemplateIngredient>,
    #[serde(default)]
    pub vegan: bool,
}

impl RecipeDraft {
    /// Check names, amounts and description length; returns the draft with
    /// its description trimmed and HTML-escaped.
    pub fn validate(self) -> Result<Self, CatalogError> {
        let name = self.name.trim().to_string();
        if !is_valid_name(&name) {
            return Err(invalid(
                "name",
                "recipe name must be 1-100 letters, digits, spaces or - . , ( )",
            ));
        }
        if self.ingredients.is_empty() {
            return Err(invalid("ingredients", "a recipe needs at least one ingredient"));
        }
        for ingredient in &self.ingredients {
            if !is_valid_name(&ingredient.name) {
                return Err(invalid(
                    "ingredients.name",
                    format!("invalid ingredient name: {}", ingredient.name),
                ));
            }
            if !is_valid_recipe_grams(ingredient.grams) {
                return Err(invalid(
                    "ingredients.grams",
                    format!("invalid grams amount for {}", ingredient.name),
                ));
            }
        }
        let description = sanitize_description(&self.description);
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(invalid("description", "description too long"));
        }
        Ok(Self {
            name,
            description,
            ingredients: self.ingredients,
            vegan: self.vegan,
        })
    }
}

fn invalid(field: &str, message: impl Into<String>) -> CatalogError {
    CatalogError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

pub fn is_valid_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && NAME_PATTERN.is_match(name)
}

pub fn is_valid_recipe_grams(grams: f64) -> bool {
    grams > 0.0 && grams <= MAX_RECIPE_GRAMS
}

/// Escapes `& < > " '` only; slashes and other punctuation are kept as typed.
pub fn sanitize_description(description: &str) -> String {
    html_escape::encode_quoted_attribute(description.trim()).into_owned()
}

/// Per-100g nutritional facts, looked up by case-insensitive name.
#[async_trait]
pub trait IngredientCatalog: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<NutrientFacts, CatalogError>;

    async fn list_names(&self) -> Result<Vec<String>, CatalogError>;

    /// Reachability check for the health route.
    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    /// All recipes, ordered by name ascending.
    async fn list_recipes(&self) -> Result<Vec<Recipe>, CatalogError>;

    async fn get_recipe(&self, name: &str) -> Result<Recipe, CatalogError>;

    async fn add_recipe(&self, draft: RecipeDraft) -> Result<Recipe, CatalogError>;
}

/// Autocomplete: catalog names starting with `query` (case-insensitive), sorted.
pub async fn suggest_names(
    catalog: &dyn IngredientCatalog,
    query: &str,
) -> Result<Vec<String>, CatalogError> {
    let query = query.trim().to_lowercase();
    let mut names: Vec<String> = catalog
        .list_names()
        .await?
        .into_iter()
        .filter(|name| name.to_lowercase().starts_with(&query))
        .collect();
    names.sort();
    Ok(names)
}

/// In-process catalog backed by ordered maps. Used for tests and local demos.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    ingredients: RwLock<BTreeMap<String, (String, NutrientFacts)>>,
    recipes: RwLock<BTreeMap<String, Recipe>>,
    next_recipe_id: AtomicI64,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ingredient(self, name: &str, per_100g: NutrientFacts) -> Self {
        self.ingredients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_lowercase(), (name.to_string(), per_100g));
        self
    }

    pub fn with_recipe(self, name: &str, ingredients: &[(&str, f64)]) -> Self {
        let id = self.next_recipe_id.fetch_add(1, Ordering::Relaxed) + 1;
        let recipe = Recipe {
            id,
            name: name.to_string(),
            description: String::new(),
            ingredients: ingredients
                .iter()
                .map(|(name, grams)| TemplateIngredient {
                    name: name.to_string(),
                    grams: *grams,
                })
                .collect(),
            vegan: false,
        };
        self.recipes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipe.name.clone(), recipe);
        self
    }
}

#[async_trait]
impl IngredientCatalog for InMemoryCatalog {
    async fn lookup(&self, name: &str) -> Result<NutrientFacts, CatalogError> {
        self.ingredients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_lowercase())
            .map(|(_, facts)| *facts)
            .ok_or_else(|| CatalogError::NotFound(format!("ingredient '{name}'")))
    }

    async fn list_names(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self
            .ingredients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[async_trait]
impl RecipeCatalog for InMemoryCatalog {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, CatalogError> {
        Ok(self
            .recipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    async fn get_recipe(&self, name: &str) -> Result<Recipe, CatalogError> {
        self.recipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("recipe '{name}'")))
    }

    async fn add_recipe(&self, draft: RecipeDraft) -> Result<Recipe, CatalogError> {
        let draft = draft.validate()?;
        let mut recipes = self.recipes.write().unwrap_or_else(PoisonError::into_inner);
        if recipes.contains_key(&draft.name) {
            return Err(CatalogError::Duplicate(draft.name));
        }
        let recipe = Recipe {
            id: self.next_recipe_id.fetch_add(1, Ordering::Relaxed) + 1,
            name: draft.name,
            description: draft.description,
            ingredients: draft.ingredients,
            vegan: draft.vegan,
        };
        recipes.insert(recipe.name.clone(), recipe.clone());
        Ok(recipe)
    }
}
