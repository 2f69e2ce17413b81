use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::catalog::{CatalogError, IngredientCatalog};
use crate::nutrition::{self, Ingredient, NutritionTotals, TemplateIngredient};

/// Sessions idle for longer than this are dropped by the sweeper.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// How often the sweeper runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("unknown ingredient '{0}'")]
    Unknown(String),
    #[error("ingredient '{0}' already added")]
    AlreadyExists(String),
    #[error(transparent)]
    Catalog(CatalogError),
}

#[derive(Debug)]
struct SessionEntry {
    ingredients: Vec<Ingredient>,
    last_seen: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            ingredients: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

/// Per-session working ingredient lists.
///
/// Every operation goes through a single mutex over the whole map. Critical
/// sections are in-memory only: the catalog lookup in [`SessionLedger::add`]
/// happens before the lock is taken, and no guard is held across an `.await`.
/// An absent session behaves exactly like an empty one.
#[derive(Debug, Default)]
pub struct SessionLedger {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve `template` against the catalog and append it to the session.
    ///
    /// The name is trimmed and lower-cased before lookup; that lower-cased
    /// name is the de-duplication key and the stored name.
    pub async fn add(
        &self,
        session_id: &str,
        template: TemplateIngredient,
        catalog: &dyn IngredientCatalog,
    ) -> Result<Ingredient, LedgerError> {
        let name = normalize_name(&template.name);
        if name.is_empty() {
            return Err(LedgerError::Invalid {
                field: "name",
                message: "ingredient name must not be empty".to_string(),
            });
        }
        if !(template.grams.is_finite() && template.grams > 0.0) {
            return Err(LedgerError::Invalid {
                field: "grams",
                message: "grams must be greater than zero".to_string(),
            });
        }

        let per_100g = match catalog.lookup(&name).await {
            Ok(facts) => facts,
            Err(CatalogError::NotFound(_)) => return Err(LedgerError::Unknown(name)),
            Err(err) => return Err(LedgerError::Catalog(err)),
        };
        let ingredient = Ingredient::from_per_100g(name, template.grams, &per_100g);

        let mut sessions = self.sessions();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionEntry::new);
        entry.touch();
        if entry
            .ingredients
            .iter()
            .any(|existing| normalize_name(&existing.name) == ingredient.name)
        {
            return Err(LedgerError::AlreadyExists(ingredient.name));
        }
        entry.ingredients.push(ingredient.clone());
        Ok(ingredient)
    }

    /// The session's ingredients, sorted by name ascending.
    pub fn list(&self, session_id: &str) -> Vec<Ingredient> {
        let mut sessions = self.sessions();
        let Some(entry) = sessions.get_mut(session_id) else {
            return Vec::new();
        };
        entry.touch();
        entry.ingredients.sort_by(|a, b| a.name.cmp(&b.name));
        entry.ingredients.clone()
    }

    /// Remove the ingredient matching `name` case-insensitively. Returns
    /// whether anything was removed; a miss is not an error.
    pub fn remove(&self, session_id: &str, name: &str) -> bool {
        let target = normalize_name(name);
        let mut sessions = self.sessions();
        let Some(entry) = sessions.get_mut(session_id) else {
            return false;
        };
        entry.touch();
        let before = entry.ingredients.len();
        entry
            .ingredients
            .retain(|ingredient| normalize_name(&ingredient.name) != target);
        entry.ingredients.len() != before
    }

    pub fn reset(&self, session_id: &str) {
        if let Some(entry) = self.sessions().get_mut(session_id) {
            entry.touch();
            entry.ingredients.clear();
        }
    }

    pub fn totals(&self, session_id: &str) -> NutritionTotals {
        let mut sessions = self.sessions();
        match sessions.get_mut(session_id) {
            Some(entry) => {
                entry.touch();
                nutrition::sum(&entry.ingredients)
            }
            None => NutritionTotals::default(),
        }
    }

    /// Lower-cased ingredient names currently in the session, for recipe matching.
    pub fn ingredient_names(&self, session_id: &str) -> HashSet<String> {
        let mut sessions = self.sessions();
        let Some(entry) = sessions.get_mut(session_id) else {
            return HashSet::new();
        };
        entry.touch();
        entry
            .ingredients
            .iter()
            .map(|ingredient| normalize_name(&ingredient.name))
            .collect()
    }

    /// Sessions touched within `idle_ttl` of `now`.
    pub fn active_since(&self, now: Instant, idle_ttl: Duration) -> HashSet<String> {
        self.sessions()
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_seen) <= idle_ttl)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Drop sessions not touched within `idle_ttl` of `now`, except those in
    /// `live`. Returns how many were evicted.
    pub fn sweep_idle(&self, now: Instant, idle_ttl: Duration, live: &HashSet<String>) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            live.contains(id) || now.saturating_duration_since(entry.last_seen) <= idle_ttl
        });
        before - sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::nutrition::NutrientFacts;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_ingredient(
                "egg",
                NutrientFacts {
                    calories: 155.0,
                    proteins: 13.0,
                    carbs: 1.1,
                    fats: 11.0,
                    fiber: 0.0,
                },
            )
            .with_ingredient(
                "Oats",
                NutrientFacts {
                    calories: 389.0,
                    proteins: 16.9,
                    carbs: 66.3,
                    fats: 6.9,
                    fiber: 10.6,
                },
            )
            .with_ingredient(
                "banana",
                NutrientFacts {
                    calories: 89.0,
                    proteins: 1.1,
                    carbs: 22.8,
                    fats: 0.3,
                    fiber: 2.6,
                },
            )
    }

    fn template(name: &str, grams: f64) -> TemplateIngredient {
        TemplateIngredient {
            name: name.to_string(),
            grams,
        }
    }

    #[tokio::test]
    async fn egg_session_walkthrough() {
        let ledger = SessionLedger::new();
        let catalog = catalog();

        let egg = ledger.add("s1", template("egg", 50.0), &catalog).await.unwrap();
        assert_eq!(egg.nutrients.calories, 77.5);

        let err = ledger
            .add("s1", template("EGG ", 120.0), &catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyExists(ref name) if name == "egg"));
        assert_eq!(ledger.list("s1").len(), 1);

        let totals = ledger.totals("s1");
        assert_eq!(totals.nutrients.calories, 77.5);
        assert_eq!(totals.name, "Your recipe");

        ledger.reset("s1");
        assert!(ledger.list("s1").is_empty());
    }

    #[tokio::test]
    async fn add_rejects_bad_input_before_lookup() {
        let ledger = SessionLedger::new();
        let catalog = catalog();

        for grams in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = ledger
                .add("s1", template("egg", grams), &catalog)
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::Invalid { field: "grams", .. }));
        }
        let err = ledger
            .add("s1", template("   ", 10.0), &catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Invalid { field: "name", .. }));
        assert_eq!(ledger.session_count(), 0);
    }

    #[tokio::test]
    async fn unknown_ingredient_is_distinct_from_conflict() {
        let ledger = SessionLedger::new();
        let err = ledger
            .add("s1", template("dragonfruit", 10.0), &catalog())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unknown(ref name) if name == "dragonfruit"));
        assert!(ledger.list("s1").is_empty());
    }

    #[tokio::test]
    async fn stored_name_is_lower_cased() {
        let ledger = SessionLedger::new();
        let oats = ledger
            .add("s1", template("  OATS", 40.0), &catalog())
            .await
            .unwrap();
        assert_eq!(oats.name, "oats");
        assert_eq!(oats.grams, 40.0);
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let ledger = SessionLedger::new();
        let catalog = catalog();
        for name in ["oats", "egg", "banana"] {
            ledger.add("s1", template(name, 10.0), &catalog).await.unwrap();
        }
        let names: Vec<String> = ledger.list("s1").into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["banana", "egg", "oats"]);
    }

    #[tokio::test]
    async fn remove_is_case_insensitive_and_missing_is_noop() {
        let ledger = SessionLedger::new();
        let catalog = catalog();
        ledger.add("s1", template("egg", 50.0), &catalog).await.unwrap();
        ledger.add("s1", template("oats", 40.0), &catalog).await.unwrap();

        assert!(!ledger.remove("s1", "tofu"));
        assert_eq!(ledger.list("s1").len(), 2);
        assert!(!ledger.remove("nobody", "egg"));

        assert!(ledger.remove("s1", "EGG"));
        let names: Vec<String> = ledger.list("s1").into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["oats"]);
    }

    #[tokio::test]
    async fn reset_only_touches_one_session() {
        let ledger = SessionLedger::new();
        let catalog = catalog();
        ledger.add("s1", template("egg", 50.0), &catalog).await.unwrap();
        ledger.add("s2", template("egg", 70.0), &catalog).await.unwrap();

        ledger.reset("s1");
        assert!(ledger.list("s1").is_empty());
        assert_eq!(ledger.list("s2").len(), 1);
        assert_eq!(ledger.list("s2")[0].grams, 70.0);
    }

    #[test]
    fn absent_session_reads_as_empty() {
        let ledger = SessionLedger::new();
        assert!(ledger.list("ghost").is_empty());
        assert_eq!(ledger.totals("ghost"), NutritionTotals::default());
        assert!(ledger.ingredient_names("ghost").is_empty());
        ledger.reset("ghost");
        assert_eq!(ledger.session_count(), 0);
    }

    #[tokio::test]
    async fn sweep_drops_only_idle_sessions() {
        let ledger = SessionLedger::new();
        let catalog = catalog();
        ledger.add("s1", template("egg", 50.0), &catalog).await.unwrap();

        let none = HashSet::new();
        assert_eq!(ledger.sweep_idle(Instant::now(), DEFAULT_IDLE_TTL, &none), 0);
        let later = Instant::now() + DEFAULT_IDLE_TTL + Duration::from_secs(1);
        assert!(ledger.active_since(later, DEFAULT_IDLE_TTL).is_empty());
        assert_eq!(ledger.sweep_idle(later, DEFAULT_IDLE_TTL, &none), 1);
        assert_eq!(ledger.session_count(), 0);
    }

    #[tokio::test]
    async fn sweep_keeps_sessions_live_elsewhere() {
        let ledger = SessionLedger::new();
        let catalog = catalog();
        ledger.add("s1", template("egg", 50.0), &catalog).await.unwrap();
        ledger.add("s2", template("egg", 50.0), &catalog).await.unwrap();
        assert_eq!(ledger.active_since(Instant::now(), DEFAULT_IDLE_TTL).len(), 2);

        let later = Instant::now() + DEFAULT_IDLE_TTL + Duration::from_secs(1);
        let live = HashSet::from(["s1".to_string()]);
        assert_eq!(ledger.sweep_idle(later, DEFAULT_IDLE_TTL, &live), 1);
        assert_eq!(ledger.list("s1").len(), 1);
    }

    #[tokio::test]
    async fn concurrent_adds_of_same_name_admit_exactly_one() {
        let ledger = Arc::new(SessionLedger::new());
        let catalog = Arc::new(catalog());

        let mut handles = Vec::new();
        for grams in 1..=16 {
            let ledger = ledger.clone();
            let catalog = catalog.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .add("shared", template("egg", grams as f64), catalog.as_ref())
                    .await
                    .is_ok()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(ledger.list("shared").len(), 1);
    }
}
