use std::sync::Arc;

use foodstats_core::analysis::AnalysisGateway;
use foodstats_core::catalog::{IngredientCatalog, RecipeCatalog};
use foodstats_core::ledger::SessionLedger;
use foodstats_core::profile::ProfileStore;
use foodstats_core::recommend::RecommendationGateway;

/// Shared handles for every request. The ledger and profile store are the
/// only mutable state; both own their locks.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<SessionLedger>,
    pub profiles: Arc<ProfileStore>,
    pub ingredients: Arc<dyn IngredientCatalog>,
    pub recipes: Arc<dyn RecipeCatalog>,
    pub analysis: Arc<AnalysisGateway>,
    pub recommendations: Arc<RecommendationGateway>,
    pub secure_cookies: bool,
}
