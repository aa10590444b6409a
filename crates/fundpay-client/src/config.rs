use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_NOTIFY_TTL_SECS: u64 = 5;

/// Client settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; API paths and relative file URLs resolve against it.
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    /// How long a notification stays visible before auto-dismissal.
    pub notify_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            notify_ttl: Duration::from_secs(DEFAULT_NOTIFY_TTL_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            api_url: env::var("FUNDPAY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            token: env::var("FUNDPAY_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            timeout: Duration::from_secs(try_load("FUNDPAY_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
            notify_ttl: Duration::from_secs(try_load(
                "FUNDPAY_NOTIFY_TTL_SECS",
                DEFAULT_NOTIFY_TTL_SECS,
            )),
        }
    }
}

/// Parses `key` from the environment, falling back to `default` when it is
/// unset or unparseable.
fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_load_falls_back_on_garbage() {
        // SAFETY: this test owns the variable name and nothing else reads it.
        unsafe { env::set_var("FUNDPAY_TEST_TIMEOUT_GARBAGE", "soon") };
        assert_eq!(try_load("FUNDPAY_TEST_TIMEOUT_GARBAGE", 15u64), 15);

        unsafe { env::set_var("FUNDPAY_TEST_TIMEOUT_GARBAGE", " 42 ") };
        assert_eq!(try_load("FUNDPAY_TEST_TIMEOUT_GARBAGE", 15u64), 42);
    }

    #[test]
    fn try_load_uses_default_when_unset() {
        assert_eq!(try_load("FUNDPAY_TEST_DEFINITELY_UNSET", 7u64), 7);
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:5000");
        assert!(config.token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(15));
    }
}
