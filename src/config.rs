use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::log_index::DuplicatePolicy;

#[derive(Parser, Debug, Clone)]
#[command(name = "gainz", about = "Log the sets of a workout session")]
pub struct Config {
    /// Backend base URL
    #[arg(long, env = "GAINZ_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Bearer token for the backend
    #[arg(long, env = "GAINZ_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Session to open
    #[arg(long, env = "GAINZ_SESSION_ID")]
    pub session: Option<u64>,

    /// Start a new session for this workout instead of opening one
    #[arg(long, conflicts_with = "session")]
    pub start_workout: Option<u64>,

    #[arg(long, env = "GAINZ_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Resolve sets logged twice by the newest entry
    #[arg(long)]
    pub latest_wins: bool,
}

impl Config {
    pub fn load() -> Self {
        let config = Self::parse();
        config.report();
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.latest_wins {
            DuplicatePolicy::LatestWins
        } else {
            DuplicatePolicy::FirstWins
        }
    }

    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    fn report(&self) {
        info!(api_url = %self.api_url, timeout_secs = self.timeout_secs, "configuration loaded");
        if self.token.is_none() {
            warn!("GAINZ_TOKEN not set, requests will be sent without authorization");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["gainz"]).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.duplicate_policy(), DuplicatePolicy::FirstWins);
        assert!(config.start_workout.is_none());
    }

    #[test]
    fn flags_override() {
        let config = Config::try_parse_from([
            "gainz",
            "--api-url",
            "https://gym.example.com/",
            "--session",
            "12",
            "--latest-wins",
            "--timeout-secs",
            "3",
        ])
        .unwrap();
        assert_eq!(config.base_url(), "https://gym.example.com");
        assert_eq!(config.session, Some(12));
        assert_eq!(config.duplicate_policy(), DuplicatePolicy::LatestWins);
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn session_and_start_conflict() {
        let parsed = Config::try_parse_from(["gainz", "--session", "1", "--start-workout", "2"]);
        assert!(parsed.is_err());
    }
}
