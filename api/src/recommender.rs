//! Recipe recommender that runs an external script per request.

use std::path::PathBuf;

use async_trait::async_trait;
use foodstats_core::recommend::{self, RecipeRecommendation, RecipeRecommender, RecommenderError};

use crate::script::{Script, ScriptFailure};

/// Invokes `<program> <script> --ingredients a,b,c` and parses stdout as a
/// recipe list.
pub struct SubprocessRecommender {
    script: Script,
}

impl SubprocessRecommender {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            script: Script::new(program, script),
        }
    }
}

#[async_trait]
impl RecipeRecommender for SubprocessRecommender {
    async fn recommend(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<RecipeRecommendation>, RecommenderError> {
        let stdout = self
            .script
            .run(["--ingredients".to_string(), ingredients.join(",")])
            .await
            .map_err(|failure| match failure {
                ScriptFailure::Spawn(err) => RecommenderError::Spawn(err),
                ScriptFailure::Exit { status, stderr } => RecommenderError::Exit { status, stderr },
            })?;

        recommend::parse_output(&stdout)
    }
}
