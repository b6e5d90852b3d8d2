/*!
 * Watcher Configuration
 *
 * Watch target and poll interval, with environment overrides:
 * - POLICY_WATCH_USER: user identity (default: $USER, then "default")
 * - POLICY_WATCH_AREA: policy area (default: Education)
 * - POLICY_WATCH_NAME: policy name (default: AllowGraphingCalculator)
 * - POLICY_WATCH_INTERVAL_MS: poll interval in milliseconds (default: 500)
 */

use crate::core::errors::ConfigError;
use crate::core::limits::{
    DEFAULT_POLICY_AREA, DEFAULT_POLICY_NAME, DEFAULT_POLL_INTERVAL, FALLBACK_USER,
};
use crate::policy::{PolicyPath, UserIdentity};
use std::time::Duration;

pub const ENV_USER: &str = "POLICY_WATCH_USER";
pub const ENV_AREA: &str = "POLICY_WATCH_AREA";
pub const ENV_NAME: &str = "POLICY_WATCH_NAME";
pub const ENV_INTERVAL_MS: &str = "POLICY_WATCH_INTERVAL_MS";

/// What to watch and how often
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    pub user: UserIdentity,
    pub policy: PolicyPath,
    pub interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            user: UserIdentity::new(FALLBACK_USER),
            policy: PolicyPath::new(DEFAULT_POLICY_AREA, DEFAULT_POLICY_NAME),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WatcherConfig {
    pub fn new(user: impl Into<UserIdentity>, policy: PolicyPath, interval: Duration) -> Self {
        Self {
            user: user.into(),
            policy,
            interval,
        }
    }

    /// Defaults overridden by POLICY_WATCH_* environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user) = env_value(ENV_USER).or_else(|| env_value("USER")) {
            config.user = UserIdentity::new(user);
        }
        if let Some(area) = env_value(ENV_AREA) {
            config.policy.area = area;
        }
        if let Some(name) = env_value(ENV_NAME) {
            config.policy.name = name;
        }
        if let Some(raw) = env_value(ENV_INTERVAL_MS) {
            config.interval = parse_interval_ms(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.user.is_valid() {
            return Err(ConfigError::EmptyField("user".into()));
        }
        if self.policy.area.trim().is_empty() {
            return Err(ConfigError::EmptyField("area".into()));
        }
        if self.policy.name.trim().is_empty() {
            return Err(ConfigError::EmptyField("name".into()));
        }
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval("interval must be non-zero".into()));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a millisecond count into a non-zero duration
pub fn parse_interval_ms(raw: &str) -> Result<Duration, ConfigError> {
    let millis: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidInterval(format!("not a number: {:?}", raw)))?;
    if millis == 0 {
        return Err(ConfigError::InvalidInterval("interval must be non-zero".into()));
    }
    Ok(Duration::from_millis(millis))
}
