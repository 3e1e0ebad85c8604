use std::env;
use std::fmt;
use std::ops::Deref;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the account identifier.
pub const ACCOUNT_VAR: &str = "ZONELINK_ACCOUNT";
/// Environment variable holding the credential secret.
pub const SECRET_VAR: &str = "ZONELINK_SECRET";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration value {0}")]
    Missing(&'static str),
    #[error("configuration value {0} must not be empty")]
    Empty(&'static str),
}

/// Credential secret. The `Debug` form is redacted so configs can be logged.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secret(String);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl Deref for Secret {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The two values the startup contract requires: who to log in as, and the
/// secret proving it. Immutable for the life of the supervisor; reconnects
/// reuse them as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    account: String,
    secret: Secret,
}

impl Credentials {
    /// Builds credentials, rejecting empty values.
    pub fn new(account: impl Into<String>, secret: impl Into<Secret>) -> Result<Self, ConfigError> {
        let account = account.into();
        let secret = secret.into();
        if account.is_empty() {
            return Err(ConfigError::Empty("account"));
        }
        if secret.is_empty() {
            return Err(ConfigError::Empty("secret"));
        }
        Ok(Self { account, secret })
    }

    /// Reads [`ACCOUNT_VAR`] and [`SECRET_VAR`] from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let account = env::var(ACCOUNT_VAR).map_err(|_| ConfigError::Missing(ACCOUNT_VAR))?;
        let secret = env::var(SECRET_VAR).map_err(|_| ConfigError::Missing(SECRET_VAR))?;
        Self::new(account, secret)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }
}

/// Cadence and thresholds for the lifecycle loops.
///
/// The defaults are the production constants; tests shrink the intervals.
/// Durations cross the serde boundary as milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay between successful poll iterations.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
    /// Delay between reconnect attempts.
    #[serde(rename = "retry_interval_ms", with = "millis")]
    pub retry_interval: Duration,
    /// Delay between zone-discovery polls.
    #[serde(rename = "discovery_interval_ms", with = "millis")]
    pub discovery_interval: Duration,
    /// Consecutive poll failures tolerated before forcing a reconnect.
    pub max_errors: u32,
    /// Successful polls between forced status refreshes.
    pub heartbeat_period: u32,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            retry_interval: Duration::from_secs(60),
            discovery_interval: Duration::from_secs(1),
            max_errors: 5,
            heartbeat_period: 6,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_production_cadence() {
        let config = SupervisorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.retry_interval, Duration::from_secs(60));
        assert_eq!(config.discovery_interval, Duration::from_secs(1));
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.heartbeat_period, 6);
    }

    #[test]
    fn intervals_deserialize_from_milliseconds() {
        let config: SupervisorConfig = serde_json::from_value(serde_json::json!({
            "poll_interval_ms": 250,
            "max_errors": 2,
        }))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_errors, 2);
        assert_eq!(config.retry_interval, Duration::from_secs(60));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert_eq!(
            Credentials::new("", "hunter2").unwrap_err(),
            ConfigError::Empty("account")
        );
        assert_eq!(
            Credentials::new("home@example.com", "").unwrap_err(),
            ConfigError::Empty("secret")
        );
    }

    #[test]
    fn from_env_requires_both_values() {
        env::remove_var(ACCOUNT_VAR);
        env::remove_var(SECRET_VAR);
        assert_eq!(
            Credentials::from_env().unwrap_err(),
            ConfigError::Missing(ACCOUNT_VAR)
        );

        env::set_var(ACCOUNT_VAR, "home@example.com");
        assert_eq!(
            Credentials::from_env().unwrap_err(),
            ConfigError::Missing(SECRET_VAR)
        );

        env::set_var(SECRET_VAR, "hunter2");
        let credentials = Credentials::from_env().unwrap();
        assert_eq!(credentials.account(), "home@example.com");

        env::remove_var(ACCOUNT_VAR);
        env::remove_var(SECRET_VAR);
    }

    #[test]
    fn secret_never_shows_in_debug_output() {
        let credentials = Credentials::new("home@example.com", "hunter2").unwrap();
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("home@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
