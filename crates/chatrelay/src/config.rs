use std::{env, time::Duration};

/// Tuning knobs loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Delay between synthetic publishes in milliseconds (default: 3,000)
    pub synthetic_interval_ms: u64,
    /// How long shutdown waits for the listener in milliseconds (default: 2,000)
    pub shutdown_grace_ms: u64,
    /// How long `verify` waits for the last message in milliseconds (default: 5,000)
    pub verify_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SYNTHETIC_INTERVAL_MS` - Synthetic publish interval (default: 3,000)
    /// - `SHUTDOWN_GRACE_MS` - Listener shutdown grace period (default: 2,000)
    /// - `VERIFY_TIMEOUT_MS` - Verify receive timeout (default: 5,000)
    ///
    /// Values that do not parse as a positive number of milliseconds fall
    /// back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .unwrap_or(default)
        };

        Self {
            synthetic_interval_ms: millis("SYNTHETIC_INTERVAL_MS", 3_000),
            shutdown_grace_ms: millis("SHUTDOWN_GRACE_MS", 2_000),
            verify_timeout_ms: millis("VERIFY_TIMEOUT_MS", 5_000),
        }
    }

    pub fn synthetic_interval(&self) -> Duration {
        Duration::from_millis(self.synthetic_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config.synthetic_interval(), Duration::from_secs(3));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(2));
        assert_eq!(config.verify_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(|key| match key {
            "SYNTHETIC_INTERVAL_MS" => Some("50".to_string()),
            "SHUTDOWN_GRACE_MS" => Some("10".to_string()),
            _ => None,
        });

        assert_eq!(config.synthetic_interval(), Duration::from_millis(50));
        assert_eq!(config.shutdown_grace(), Duration::from_millis(10));
        assert_eq!(config.verify_timeout_ms, 5_000);
    }

    #[test]
    fn test_unparsable_values_fall_back_to_defaults() {
        let config = Config::from_lookup(|_| Some("soon".to_string()));
        assert_eq!(config.synthetic_interval_ms, 3_000);
    }

    #[test]
    fn test_zero_falls_back_to_defaults() {
        let config = Config::from_lookup(|_| Some("0".to_string()));

        assert_eq!(config.synthetic_interval(), Duration::from_secs(3));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(2));
        assert_eq!(config.verify_timeout(), Duration::from_secs(5));
    }
}
