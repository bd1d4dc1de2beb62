//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::time::Duration;

use crate::sync::SyncConfig;

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the game server
    pub server_url: String,
    /// Game to join
    pub game_id: String,
    /// Delay between state polls once joined
    pub poll_interval_ms: u64,
    /// Delay between failed join attempts
    pub join_retry_delay_ms: u64,
    /// Join attempts before giving up (0 means never give up)
    pub join_max_attempts: u32,
    /// Per-request timeout
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            game_id: "FIRST_GAME".to_string(),
            poll_interval_ms: 2000,
            join_retry_delay_ms: 5000,
            join_max_attempts: 0,
            request_timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `server_override` - Optional server URL override (from CLI args)
    /// * `game_override` - Optional game id override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but unusable
    pub fn from_env(
        server_override: Option<String>,
        game_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(server_override, game_override, |key| std::env::var(key).ok())
    }

    /// Load configuration reading variables through `lookup`
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but unusable
    pub fn from_lookup<F>(
        server_override: Option<String>,
        game_override: Option<String>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_url = server_override
            .or_else(|| lookup("CRIB_SERVER_URL"))
            .unwrap_or(defaults.server_url);

        let game_id = game_override
            .or_else(|| lookup("CRIB_GAME_ID"))
            .unwrap_or(defaults.game_id);

        let config = Self {
            server_url,
            game_id,
            poll_interval_ms: parse_env_or(
                &lookup,
                "CRIB_POLL_INTERVAL_MS",
                defaults.poll_interval_ms,
            ),
            join_retry_delay_ms: parse_env_or(
                &lookup,
                "CRIB_JOIN_RETRY_DELAY_MS",
                defaults.join_retry_delay_ms,
            ),
            join_max_attempts: parse_env_or(
                &lookup,
                "CRIB_JOIN_MAX_ATTEMPTS",
                defaults.join_max_attempts,
            ),
            request_timeout_ms: parse_env_or(
                &lookup,
                "CRIB_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first setting that can't be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "CRIB_SERVER_URL".to_string(),
                reason: format!("Must start with http:// or https:// (got '{}')", self.server_url),
            });
        }

        if self.game_id.trim().is_empty() || self.game_id.contains('/') {
            return Err(ConfigError::Invalid {
                var: "CRIB_GAME_ID".to_string(),
                reason: "Must be non-empty and contain no '/'".to_string(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "CRIB_POLL_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.join_retry_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "CRIB_JOIN_RETRY_DELAY_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "CRIB_REQUEST_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Timing policy for the sync controller
    #[must_use]
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            join_retry_delay: Duration::from_millis(self.join_retry_delay_ms),
            join_max_attempts: (self.join_max_attempts > 0).then_some(self.join_max_attempts),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_env_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
