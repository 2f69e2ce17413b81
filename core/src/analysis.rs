//! Health-score enrichment through an external analysis collaborator.
//!
//! [`AnalysisGateway::analyze`] never fails: a collaborator that cannot be
//! reached, exits non-zero, prints something unparsable or misses its deadline
//! yields [`AnalysisOutcome::Degraded`] carrying locally computed totals.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use utoipa::ToSchema;

use crate::nutrition::{self, Ingredient, NutrientFacts};
use crate::profile::UserProfile;

pub const DEGRADED_RECOMMENDATION: &str = "AI analysis unavailable. Showing only basic nutrition.";

pub const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer could not be started: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("analyzer exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("analyzer output is not a valid analysis: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("analyzer did not answer within {0:?}")]
    TimedOut(Duration),
}

/// Full analysis as produced by the collaborator.
///
/// Sections the collaborator omits stay omitted on the way out, and keys this
/// type does not name are carried in `extra` and re-emitted unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NutritionAnalysis {
    pub health_score: f64,
    pub recommendations: Vec<String>,
    pub nutrient_balance: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_scores: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_breakdown: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<serde_json::Value>,
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Fallback result: only the five summed nutrients are known.
///
/// Serializes with the same keys as [`NutritionAnalysis`], the AI-derived ones
/// set to `null`, plus a `totals` block.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedAnalysis {
    pub recommendations: Vec<String>,
    pub totals: NutrientFacts,
}

impl DegradedAnalysis {
    pub fn from_ingredients(ingredients: &[Ingredient]) -> Self {
        Self {
            recommendations: vec![DEGRADED_RECOMMENDATION.to_string()],
            totals: nutrition::sum(ingredients).nutrients,
        }
    }
}

impl Serialize for DegradedAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let none = Option::<()>::None;
        let mut state = serializer.serialize_struct("DegradedAnalysis", 6)?;
        state.serialize_field("health_score", &none)?;
        state.serialize_field("recommendations", &self.recommendations)?;
        state.serialize_field("nutrient_balance", &none)?;
        state.serialize_field("nutrient_scores", &none)?;
        state.serialize_field("metrics_breakdown", &none)?;
        state.serialize_field("totals", &self.totals)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Enriched(NutritionAnalysis),
    Degraded(DegradedAnalysis),
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded(_))
    }

    pub fn health_score(&self) -> Option<f64> {
        match self {
            AnalysisOutcome::Enriched(analysis) => Some(analysis.health_score),
            AnalysisOutcome::Degraded(_) => None,
        }
    }
}

/// The external analysis process, seen as a black box.
#[async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        ingredients: &[Ingredient],
        profile: Option<&UserProfile>,
    ) -> Result<NutritionAnalysis, AnalyzerError>;
}

pub struct AnalysisGateway {
    analyzer: Arc<dyn NutritionAnalyzer>,
    deadline: Duration,
}

impl AnalysisGateway {
    pub fn new(analyzer: Arc<dyn NutritionAnalyzer>, deadline: Duration) -> Self {
        Self { analyzer, deadline }
    }

    /// One attempt, no retry, no cache. Dropping the collaborator future on
    /// timeout is the adapter's signal to abandon its work.
    pub async fn analyze(
        &self,
        ingredients: &[Ingredient],
        profile: Option<&UserProfile>,
    ) -> AnalysisOutcome {
        let attempt = tokio::time::timeout(self.deadline, self.analyzer.analyze(ingredients, profile));
        let result = match attempt.await {
            Ok(result) => result,
            Err(_) => Err(AnalyzerError::TimedOut(self.deadline)),
        };

        match result {
            Ok(analysis) => {
                tracing::debug!(
                    ingredients = ingredients.len(),
                    personalized = profile.is_some(),
                    health_score = analysis.health_score,
                    outcome = "enriched",
                    "nutrition analysis completed"
                );
                AnalysisOutcome::Enriched(analysis)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    ingredients = ingredients.len(),
                    outcome = "degraded",
                    "nutrition analysis unavailable, falling back to local totals"
                );
                AnalysisOutcome::Degraded(DegradedAnalysis::from_ingredients(ingredients))
            }
        }
    }
}
