use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

const AGE_RANGE: RangeInclusive<i32> = 1..=120;
const WEIGHT_RANGE_KG: RangeInclusive<f64> = 20.0..=300.0;
const HEIGHT_RANGE_CM: RangeInclusive<f64> = 100.0..=250.0;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Personal data used to personalise nutrition analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UserProfile {
    pub age: i32,
    pub gender: String,
    /// Kilograms
    pub weight: f64,
    /// Centimetres
    pub height: f64,
    #[serde(rename = "activityLevel")]
    pub activity_level: String,
    pub goal: String,
    pub dietary_restrictions: BTreeSet<String>,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !AGE_RANGE.contains(&self.age) {
            return Err(ProfileError::Invalid {
                field: "age",
                message: "age must be between 1 and 120".to_string(),
            });
        }
        if !WEIGHT_RANGE_KG.contains(&self.weight) {
            return Err(ProfileError::Invalid {
                field: "weight",
                message: "weight must be between 20 and 300 kg".to_string(),
            });
        }
        if !HEIGHT_RANGE_CM.contains(&self.height) {
            return Err(ProfileError::Invalid {
                field: "height",
                message: "height must be between 100 and 250 cm".to_string(),
            });
        }
        Ok(())
    }
}

/// Session-keyed profiles. Same locking discipline as the ledger.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: Mutex<HashMap<String, (UserProfile, Instant)>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn profiles(&self) -> MutexGuard<'_, HashMap<String, (UserProfile, Instant)>> {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn save(&self, session_id: &str, profile: UserProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        self.profiles()
            .insert(session_id.to_string(), (profile, Instant::now()));
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Option<UserProfile> {
        let mut profiles = self.profiles();
        let (profile, last_seen) = profiles.get_mut(session_id)?;
        *last_seen = Instant::now();
        Some(profile.clone())
    }

    pub fn reset(&self, session_id: &str) {
        self.profiles().remove(session_id);
    }

    /// Sessions whose profile was saved or read within `idle_ttl` of `now`.
    pub fn active_since(&self, now: Instant, idle_ttl: Duration) -> HashSet<String> {
        self.profiles()
            .iter()
            .filter(|(_, (_, last_seen))| now.saturating_duration_since(*last_seen) <= idle_ttl)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Same contract as [`crate::ledger::SessionLedger::sweep_idle`].
    pub fn sweep_idle(&self, now: Instant, idle_ttl: Duration, live: &HashSet<String>) -> usize {
        let mut profiles = self.profiles();
        let before = profiles.len();
        profiles.retain(|id, (_, last_seen)| {
            live.contains(id) || now.saturating_duration_since(*last_seen) <= idle_ttl
        });
        before - profiles.len()
    }
}
