//! Postgres-backed ingredient and recipe catalog.

use std::collections::HashMap;

use async_trait::async_trait;
use foodstats_core::catalog::{CatalogError, IngredientCatalog, Recipe, RecipeCatalog, RecipeDraft};
use foodstats_core::nutrition::{NutrientFacts, TemplateIngredient};
use sqlx::PgPool;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgCatalog {
    db: PgPool,
}

impl PgCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(sqlx::FromRow)]
struct FactsRow {
    calories: f64,
    proteins: f64,
    carbs: f64,
    fats: f64,
    fiber: f64,
}

impl From<FactsRow> for NutrientFacts {
    fn from(row: FactsRow) -> Self {
        Self {
            calories: row.calories,
            proteins: row.proteins,
            carbs: row.carbs,
            fats: row.fats,
            fiber: row.fiber,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    name: String,
    description: String,
    vegan: bool,
}

#[derive(sqlx::FromRow)]
struct RecipeIngredientRow {
    recipe_id: i64,
    ingredient_name: String,
    grams: f64,
}

impl RecipeRow {
    fn into_recipe(self, ingredients: Vec<TemplateIngredient>) -> Recipe {
        Recipe {
            id: self.id,
            name: self.name,
            description: self.description,
            ingredients,
            vegan: self.vegan,
        }
    }
}

fn storage(err: sqlx::Error) -> CatalogError {
    CatalogError::Storage(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl IngredientCatalog for PgCatalog {
    async fn lookup(&self, name: &str) -> Result<NutrientFacts, CatalogError> {
        let row = sqlx::query_as::<_, FactsRow>(
            r#"
            SELECT calories, proteins, carbs, fats, fiber
            FROM ingredients
            WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .map_err(storage)?;

        row.map(NutrientFacts::from)
            .ok_or_else(|| CatalogError::NotFound(format!("Ingredient '{name}'")))
    }

    async fn list_names(&self) -> Result<Vec<String>, CatalogError> {
        sqlx::query_scalar::<_, String>("SELECT name FROM ingredients ORDER BY name")
            .fetch_all(&self.db)
            .await
            .map_err(storage)
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .map(|_| ())
            .map_err(storage)
    }
}

#[async_trait]
impl RecipeCatalog for PgCatalog {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, CatalogError> {
        let recipes = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, name, description, vegan
            FROM recipes
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(storage)?;

        let rows = sqlx::query_as::<_, RecipeIngredientRow>(
            r#"
            SELECT recipe_id, ingredient_name, grams
            FROM recipe_ingredients
            ORDER BY recipe_id, position
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(storage)?;

        let mut by_recipe: HashMap<i64, Vec<TemplateIngredient>> = HashMap::new();
        for row in rows {
            by_recipe.entry(row.recipe_id).or_default().push(TemplateIngredient {
                name: row.ingredient_name,
                grams: row.grams,
            });
        }

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let ingredients = by_recipe.remove(&recipe.id).unwrap_or_default();
                recipe.into_recipe(ingredients)
            })
            .collect())
    }

    async fn get_recipe(&self, name: &str) -> Result<Recipe, CatalogError> {
        let recipe = sqlx::query_as::<_, RecipeRow>(
            "SELECT id, name, description, vegan FROM recipes WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .map_err(storage)?
        .ok_or_else(|| CatalogError::NotFound(format!("Recipe '{name}'")))?;

        let ingredients = sqlx::query_as::<_, RecipeIngredientRow>(
            r#"
            SELECT recipe_id, ingredient_name, grams
            FROM recipe_ingredients
            WHERE recipe_id = $1
            ORDER BY position
            "#,
        )
        .bind(recipe.id)
        .fetch_all(&self.db)
        .await
        .map_err(storage)?
        .into_iter()
        .map(|row| TemplateIngredient {
            name: row.ingredient_name,
            grams: row.grams,
        })
        .collect();

        Ok(recipe.into_recipe(ingredients))
    }

    async fn add_recipe(&self, draft: RecipeDraft) -> Result<Recipe, CatalogError> {
        let draft = draft.validate()?;
        let mut tx = self.db.begin().await.map_err(storage)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO recipes (name, description, vegan)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.vegan)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                CatalogError::Duplicate(draft.name.clone())
            } else {
                storage(err)
            }
        })?;

        for (position, ingredient) in draft.ingredients.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_ingredients (recipe_id, position, ingredient_name, grams)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(&ingredient.name)
            .bind(ingredient.grams)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;
        tracing::info!(recipe = %draft.name, recipe_id = id, ingredients = draft.ingredients.len(), "recipe added");

        Ok(Recipe {
            id,
            name: draft.name,
            description: draft.description,
            ingredients: draft.ingredients,
            vegan: draft.vegan,
        })
    }
}
