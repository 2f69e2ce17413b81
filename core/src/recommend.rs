//! Similarity-ranked recipe recommendations from an external recommender.
//!
//! Unlike analysis there is no local fallback: a recommender failure is an
//! error for the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Reply for a request that names no usable ingredients.
pub const NO_INGREDIENTS_MESSAGE: &str = "Failed to get recommendations!";

#[derive(Debug, Error)]
pub enum RecommenderError {
    #[error("recommender could not be started: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("recommender exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("recommender output is not a recipe list: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("recommender reported: {0}")]
    Reported(String),
    #[error("recommender did not answer within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecommendedIngredient {
    pub name: String,
}

/// One recipe proposed by the recommender, with its cosine similarity to the
/// requested ingredients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecipeRecommendation {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<RecommendedIngredient>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_ingredients: Vec<String>,
    #[serde(default)]
    pub similarity: f64,
}

/// Raw recommender stdout: a recipe list, or an `{"error": ...}` object it
/// prints instead of failing.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecommenderOutput {
    Recipes(Vec<RecipeRecommendation>),
    Failure { error: String },
}

/// Decode what a recommender printed.
pub fn parse_output(stdout: &[u8]) -> Result<Vec<RecipeRecommendation>, RecommenderError> {
    match serde_json::from_slice(stdout)? {
        RecommenderOutput::Recipes(recipes) => Ok(recipes),
        RecommenderOutput::Failure { error } => Err(RecommenderError::Reported(error)),
    }
}

/// Trim names and drop blanks, keeping request order.
pub fn normalize_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
pub trait RecipeRecommender: Send + Sync {
    async fn recommend(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeRecommendation>, RecommenderError>;
}

pub struct RecommendationGateway {
    recommender: Arc<dyn RecipeRecommender>,
    deadline: Duration,
}

impl RecommendationGateway {
    pub fn new(recommender: Arc<dyn RecipeRecommender>, deadline: Duration) -> Self {
        Self {
            recommender,
            deadline,
        }
    }

    /// One attempt under the deadline. `ingredients` must already be
    /// normalized and non-empty.
    pub async fn recommend(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeRecommendation>, RecommenderError> {
        let attempt = tokio::time::timeout(self.deadline, self.recommender.recommend(ingredients));
        let result = match attempt.await {
            Ok(result) => result,
            Err(_) => Err(RecommenderError::TimedOut(self.deadline)),
        };

        match &result {
            Ok(recipes) => tracing::debug!(
                ingredients = ingredients.len(),
                recipes = recipes.len(),
                "recipe recommendations completed"
            ),
            Err(err) => tracing::warn!(
                error = %err,
                ingredients = ingredients.len(),
                "recipe recommendations failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RecipeRecommender for Recording {
        async fn recommend(
            &self,
            ingredients: &[String],
        ) -> Result<Vec<RecipeRecommendation>, RecommenderError> {
            *self.seen.lock().unwrap() = ingredients.to_vec();
            Ok(vec![RecipeRecommendation {
                name: "Omelette".to_string(),
                description: String::new(),
                ingredients: vec![RecommendedIngredient {
                    name: "egg".to_string(),
                }],
                missing_ingredients: Vec::new(),
                similarity: 0.82,
            }])
        }
    }

    struct Slow;

    #[async_trait]
    impl RecipeRecommender for Slow {
        async fn recommend(
            &self,
            _ingredients: &[String],
        ) -> Result<Vec<RecipeRecommendation>, RecommenderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn parses_recipe_list_with_extra_keys() {
        let recipes = parse_output(
            br#"[
                {"name": "Pancakes", "description": "Fluffy", "ingredients": [{"name": "flour"}, {"name": "egg"}],
                 "missing_ingredients": ["flour"], "similarity": 0.61},
                {"name": "Toast"}
            ]"#,
        )
        .unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].missing_ingredients, vec!["flour"]);
        assert_eq!(recipes[1].similarity, 0.0);
    }

    #[test]
    fn error_object_is_reported() {
        let err = parse_output(br#"{"error": "Model not found at model.joblib."}"#).unwrap_err();
        match err {
            RecommenderError::Reported(message) => assert!(message.contains("Model not found")),
            other => panic!("expected reported error, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_output(b"Traceback (most recent call last)"),
            Err(RecommenderError::Malformed(_))
        ));
    }

    #[test]
    fn empty_fields_are_omitted_on_the_wire() {
        let json = serde_json::to_value(RecipeRecommendation {
            name: "Toast".to_string(),
            description: String::new(),
            ingredients: Vec::new(),
            missing_ingredients: Vec::new(),
            similarity: 0.4,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"name": "Toast", "similarity": 0.4}));
    }

    #[test]
    fn names_are_trimmed_and_blanks_dropped() {
        let names = vec![" egg ".to_string(), "  ".to_string(), "milk".to_string()];
        assert_eq!(normalize_names(&names), vec!["egg", "milk"]);
        assert!(normalize_names(&["".to_string()]).is_empty());
    }

    #[tokio::test]
    async fn gateway_forwards_names() {
        let recording = Arc::new(Recording::default());
        let gateway = RecommendationGateway::new(recording.clone(), Duration::from_secs(5));
        let names = vec!["egg".to_string(), "milk".to_string()];
        let recipes = gateway.recommend(&names).await.unwrap();
        assert_eq!(recipes[0].name, "Omelette");
        assert_eq!(*recording.seen.lock().unwrap(), names);
    }

    #[tokio::test]
    async fn gateway_deadline_is_an_error() {
        let gateway = RecommendationGateway::new(Arc::new(Slow), Duration::from_millis(20));
        let err = gateway.recommend(&["egg".to_string()]).await.unwrap_err();
        assert!(matches!(err, RecommenderError::TimedOut(_)));
    }
}
