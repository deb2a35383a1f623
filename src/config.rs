//! Application-level configuration loading, including countdown and ranking tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_RUSH_BACK_CONFIG_PATH";
/// Environment variable holding the shared admin token.
const ADMIN_TOKEN_ENV: &str = "ADMIN_TOKEN";

/// Delay between the start command and the first servable question, so every
/// client receives the broadcast and renders a synchronized countdown.
const DEFAULT_START_BUFFER_MS: u64 = 3_000;
/// Number of entries returned by the leaderboard by default.
const DEFAULT_TOP_RANKED_COUNT: usize = 3;

/// Secondary ordering applied to leaderboard entries with equal durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTieBreak {
    /// Equal durations keep registration order (stable scan order).
    RegistrationOrder,
    /// Equal durations are ordered by completion timestamp.
    FinishedAt,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    start_buffer_ms: u64,
    top_ranked_count: usize,
    rank_tie_break: RankTieBreak,
    admin_token: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    ///
    /// The admin token is always sourced from the environment so it never lands
    /// in a checked-in config file.
    pub fn load() -> Self {
        let admin_token = env::var(ADMIN_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        if admin_token.is_none() {
            warn!("{ADMIN_TOKEN_ENV} is not set; admin endpoints will reject every request");
        }

        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration from file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.admin_token = admin_token;
        config
    }

    /// Milliseconds between the start command and the synchronized countdown end.
    pub fn start_buffer_ms(&self) -> u64 {
        self.start_buffer_ms
    }

    /// Number of leaderboard entries returned by default.
    pub fn top_ranked_count(&self) -> usize {
        self.top_ranked_count
    }

    /// Tie-break rule applied to equal leaderboard durations.
    pub fn rank_tie_break(&self) -> RankTieBreak {
        self.rank_tie_break
    }

    /// Shared secret expected in the `x-admin-token` header, if configured.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_buffer_ms: DEFAULT_START_BUFFER_MS,
            top_ranked_count: DEFAULT_TOP_RANKED_COUNT,
            rank_tie_break: RankTieBreak::RegistrationOrder,
            admin_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    start_buffer_ms: Option<u64>,
    top_ranked_count: Option<usize>,
    rank_tie_break: Option<RankTieBreak>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            start_buffer_ms: value.start_buffer_ms.unwrap_or(defaults.start_buffer_ms),
            top_ranked_count: value
                .top_ranked_count
                .unwrap_or(defaults.top_ranked_count),
            rank_tie_break: value.rank_tie_break.unwrap_or(defaults.rank_tie_break),
            admin_token: None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.start_buffer_ms(), 3_000);
        assert_eq!(config.top_ranked_count(), 3);
        assert_eq!(config.rank_tie_break(), RankTieBreak::RegistrationOrder);
        assert!(config.admin_token().is_none());
    }

    #[test]
    fn raw_config_overrides_only_present_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"start_buffer_ms": 5000, "rank_tie_break": "finished_at"}"#)
                .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.start_buffer_ms(), 5_000);
        assert_eq!(config.top_ranked_count(), 3);
        assert_eq!(config.rank_tie_break(), RankTieBreak::FinishedAt);
    }
}
