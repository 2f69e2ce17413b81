//! Analysis collaborator that runs an external script per request.

use std::path::PathBuf;

use async_trait::async_trait;
use foodstats_core::analysis::{AnalyzerError, NutritionAnalysis, NutritionAnalyzer};
use foodstats_core::nutrition::Ingredient;
use foodstats_core::profile::UserProfile;

use crate::script::{Script, ScriptFailure};

/// Invokes `<program> <script> --data <json> [--user-profile <json>]` and
/// parses stdout as a [`NutritionAnalysis`].
pub struct SubprocessAnalyzer {
    script: Script,
}

impl SubprocessAnalyzer {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            script: Script::new(program, script),
        }
    }

    fn args(
        ingredients: &[Ingredient],
        profile: Option<&UserProfile>,
    ) -> Result<Vec<String>, AnalyzerError> {
        let mut args = vec!["--data".to_string(), serde_json::to_string(ingredients)?];
        if let Some(profile) = profile {
            args.push("--user-profile".to_string());
            args.push(serde_json::to_string(profile)?);
        }
        Ok(args)
    }
}

#[async_trait]
impl NutritionAnalyzer for SubprocessAnalyzer {
    async fn analyze(
        &self,
        ingredients: &[Ingredient],
        profile: Option<&UserProfile>,
    ) -> Result<NutritionAnalysis, AnalyzerError> {
        let stdout = self
            .script
            .run(Self::args(ingredients, profile)?)
            .await
            .map_err(|failure| match failure {
                ScriptFailure::Spawn(err) => AnalyzerError::Spawn(err),
                ScriptFailure::Exit { status, stderr } => AnalyzerError::Exit { status, stderr },
            })?;

        Ok(serde_json::from_slice(&stdout)?)
    }
}
