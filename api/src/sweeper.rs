use std::sync::Arc;
use std::time::{Duration, Instant};

use foodstats_core::ledger::SessionLedger;
use foodstats_core::profile::ProfileStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically evict sessions idle for longer than `idle_ttl`. A session is
/// live if either its ledger entry or its profile was used recently.
pub fn spawn_session_sweeper(
    ledger: Arc<SessionLedger>,
    profiles: Arc<ProfileStore>,
    interval: Duration,
    idle_ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let (sessions, profiles_evicted) =
                sweep_once(&ledger, &profiles, Instant::now(), idle_ttl);
            tracing::debug!(
                sessions_evicted = sessions,
                profiles_evicted,
                sessions_remaining = ledger.session_count(),
                "idle session sweep"
            );
        }
    })
}

fn sweep_once(
    ledger: &SessionLedger,
    profiles: &ProfileStore,
    now: Instant,
    idle_ttl: Duration,
) -> (usize, usize) {
    let mut live = ledger.active_since(now, idle_ttl);
    live.extend(profiles.active_since(now, idle_ttl));
    (
        ledger.sweep_idle(now, idle_ttl, &live),
        profiles.sweep_idle(now, idle_ttl, &live),
    )
}

#[cfg(test)]
mod tests {
    use foodstats_core::catalog::InMemoryCatalog;
    use foodstats_core::nutrition::{NutrientFacts, TemplateIngredient};
    use foodstats_core::profile::UserProfile;

    use super::*;

    #[tokio::test]
    async fn sweeper_evicts_after_interval() {
        let ledger = Arc::new(SessionLedger::new());
        let profiles = Arc::new(ProfileStore::new());
        let catalog = InMemoryCatalog::new().with_ingredient("egg", NutrientFacts::default());
        ledger
            .add(
                "s1",
                TemplateIngredient {
                    name: "egg".into(),
                    grams: 10.0,
                },
                &catalog,
            )
            .await
            .unwrap();

        let handle = spawn_session_sweeper(
            ledger.clone(),
            profiles,
            Duration::from_millis(20),
            Duration::ZERO,
        );
        assert_eq!(ledger.session_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(ledger.session_count(), 0);
        handle.abort();
    }

    fn profile() -> UserProfile {
        UserProfile {
            age: 30,
            weight: 70.0,
            height: 175.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ledger_activity_keeps_profile_alive() {
        let ledger = SessionLedger::new();
        let profiles = ProfileStore::new();
        let catalog = InMemoryCatalog::new().with_ingredient("egg", NutrientFacts::default());
        profiles.save("s1", profile()).unwrap();
        profiles.save("idle", profile()).unwrap();

        let ttl = Duration::from_millis(50);
        tokio::time::sleep(Duration::from_millis(100)).await;
        ledger
            .add(
                "s1",
                TemplateIngredient {
                    name: "egg".into(),
                    grams: 10.0,
                },
                &catalog,
            )
            .await
            .unwrap();

        let (sessions, profiles_evicted) = sweep_once(&ledger, &profiles, Instant::now(), ttl);
        assert_eq!(sessions, 0);
        assert_eq!(profiles_evicted, 1);
        assert_eq!(profiles.get("s1"), Some(profile()));
        assert!(profiles.get("idle").is_none());
    }

    #[tokio::test]
    async fn profile_activity_keeps_ledger_alive() {
        let ledger = SessionLedger::new();
        let profiles = ProfileStore::new();
        let catalog = InMemoryCatalog::new().with_ingredient("egg", NutrientFacts::default());
        ledger
            .add(
                "s1",
                TemplateIngredient {
                    name: "egg".into(),
                    grams: 10.0,
                },
                &catalog,
            )
            .await
            .unwrap();

        let ttl = Duration::from_millis(50);
        tokio::time::sleep(Duration::from_millis(100)).await;
        profiles.save("s1", profile()).unwrap();

        assert_eq!(sweep_once(&ledger, &profiles, Instant::now(), ttl), (0, 0));
        assert_eq!(ledger.session_count(), 1);
    }
}
