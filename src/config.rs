//! Session configuration.
//!
//! Values come from built-in defaults, then environment variables, then
//! command-line flags, each layer overriding the previous one.

use std::time::Duration;

use tracing::{debug, warn};

/// Environment variable bounding how long consumers wait for the environment.
/// `0` or an empty value means wait forever.
pub const WAIT_TIMEOUT_ENV: &str = "READYGATE_WAIT_TIMEOUT_MS";

/// Environment variable for the simulated environment load time.
pub const LOAD_DELAY_ENV: &str = "READYGATE_LOAD_DELAY_MS";

/// Name given to the loaded environment unless overridden.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "env-42";

/// Default simulated load time
pub const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(50);

/// Settings for one test session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on how long consumers wait for the environment.
    /// `None` waits forever, which hangs if the loader never publishes.
    pub wait_timeout: Option<Duration>,
    /// How long the loader takes before reporting the environment loaded.
    pub load_delay: Duration,
    /// Name of the published environment.
    pub environment_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wait_timeout: None,
            load_delay: DEFAULT_LOAD_DELAY,
            environment_name: DEFAULT_ENVIRONMENT_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `READYGATE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_millis(WAIT_TIMEOUT_ENV) {
            config.wait_timeout = timeout_from_millis(ms);
        }
        if let Some(ms) = read_millis(LOAD_DELAY_ENV) {
            config.load_delay = Duration::from_millis(ms);
        }

        debug!("Session config from environment: {:?}", config);
        config
    }

    /// Apply command-line overrides on top of this config.
    pub fn with_overrides(mut self, timeout_ms: Option<u64>, load_delay_ms: Option<u64>) -> Self {
        if let Some(ms) = timeout_ms {
            self.wait_timeout = timeout_from_millis(ms);
        }
        if let Some(ms) = load_delay_ms {
            self.load_delay = Duration::from_millis(ms);
        }
        self
    }

    pub fn with_environment_name(mut self, name: impl Into<String>) -> Self {
        self.environment_name = name.into();
        self
    }
}

fn timeout_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Read a millisecond value from the environment.
///
/// Unset returns `None`; empty counts as `0`; anything unparsable is
/// ignored with a warning.
fn read_millis(var: &str) -> Option<u64> {
    let raw = std::env::var(var).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    match trimmed.parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(e) => {
            warn!("Ignoring invalid {}={:?}: {}", var, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{env_lock, EnvVarRestore};

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.wait_timeout, None);
        assert_eq!(config.load_delay, DEFAULT_LOAD_DELAY);
        assert_eq!(config.environment_name, "env-42");
    }

    #[test]
    fn test_from_env_reads_values() {
        let _env_lock_guard = env_lock().lock().unwrap();
        let _timeout_restore = EnvVarRestore::new(WAIT_TIMEOUT_ENV);
        let _delay_restore = EnvVarRestore::new(LOAD_DELAY_ENV);

        std::env::set_var(WAIT_TIMEOUT_ENV, "1500");
        std::env::set_var(LOAD_DELAY_ENV, " 10 ");
        let config = SessionConfig::from_env();

        assert_eq!(config.wait_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.load_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_from_env_zero_or_empty_timeout_is_unbounded() {
        let _env_lock_guard = env_lock().lock().unwrap();
        let _timeout_restore = EnvVarRestore::new(WAIT_TIMEOUT_ENV);

        std::env::set_var(WAIT_TIMEOUT_ENV, "0");
        assert_eq!(SessionConfig::from_env().wait_timeout, None);

        std::env::set_var(WAIT_TIMEOUT_ENV, "");
        assert_eq!(SessionConfig::from_env().wait_timeout, None);
    }

    #[test]
    fn test_from_env_ignores_garbage() {
        let _env_lock_guard = env_lock().lock().unwrap();
        let _timeout_restore = EnvVarRestore::new(WAIT_TIMEOUT_ENV);
        let _delay_restore = EnvVarRestore::new(LOAD_DELAY_ENV);

        std::env::set_var(WAIT_TIMEOUT_ENV, "soon");
        std::env::set_var(LOAD_DELAY_ENV, "-5");
        let config = SessionConfig::from_env();

        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = SessionConfig::default()
            .with_overrides(Some(250), Some(5))
            .with_environment_name("browser");
        assert_eq!(config.wait_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.load_delay, Duration::from_millis(5));
        assert_eq!(config.environment_name, "browser");

        let unbounded = config.with_overrides(Some(0), None);
        assert_eq!(unbounded.wait_timeout, None);
        assert_eq!(unbounded.load_delay, Duration::from_millis(5));
    }
}
