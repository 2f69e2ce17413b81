use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use foodstats_core::analysis::DEFAULT_ANALYZER_TIMEOUT;
use foodstats_core::ledger::{DEFAULT_IDLE_TTL, DEFAULT_SWEEP_INTERVAL};

const ANALYZER_SCRIPT_CANDIDATES: &[&str] = &[
    "internal/mls/analyzer.py",
    "mls/analyzer.py",
    "analyzer.py",
];

const RECOMMENDER_SCRIPT_CANDIDATES: &[&str] = &[
    "internal/mls/recommend.py",
    "mls/recommend.py",
    "recommend.py",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match std::env::var("FOODSTATS_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub environment: Environment,
    pub analyzer_program: String,
    pub analyzer_script: PathBuf,
    pub recommender_script: PathBuf,
    pub analyzer_timeout: Duration,
    pub session_idle_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let analyzer_script = std::env::var("FOODSTATS_ANALYZER_SCRIPT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| discover_script(ANALYZER_SCRIPT_CANDIDATES));
        let recommender_script = std::env::var("FOODSTATS_RECOMMENDER_SCRIPT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| discover_script(RECOMMENDER_SCRIPT_CANDIDATES));

        Ok(Self {
            database_url,
            port: parse_or("PORT", 8080),
            environment: Environment::from_env(),
            analyzer_program: std::env::var("FOODSTATS_ANALYZER_PROGRAM")
                .unwrap_or_else(|_| "python3".to_string()),
            analyzer_script,
            recommender_script,
            analyzer_timeout: Duration::from_secs(parse_or(
                "FOODSTATS_ANALYZER_TIMEOUT_SECS",
                DEFAULT_ANALYZER_TIMEOUT.as_secs(),
            )),
            session_idle_ttl: Duration::from_secs(
                parse_or("FOODSTATS_SESSION_IDLE_HOURS", DEFAULT_IDLE_TTL.as_secs() / 3600) * 3600,
            ),
            session_sweep_interval: Duration::from_secs(
                parse_or(
                    "FOODSTATS_SESSION_SWEEP_MINUTES",
                    DEFAULT_SWEEP_INTERVAL.as_secs() / 60,
                ) * 60,
            ),
            request_timeout: Duration::from_secs(parse_or("FOODSTATS_REQUEST_TIMEOUT_SECS", 30)),
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_value<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw, %default, "invalid configuration value, using default");
        default
    })
}

/// First existing candidate; falls back to the first one so the error at
/// invocation time names a sensible path.
fn discover_script(candidates: &[&str]) -> PathBuf {
    candidates
        .iter()
        .map(Path::new)
        .find(|path| path.is_file())
        .unwrap_or_else(|| Path::new(candidates[0]))
        .to_path_buf()
}
