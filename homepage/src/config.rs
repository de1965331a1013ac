//! Application configuration loaded from environment variables
//!
//! [`Config`] is built once and handed to [`App::new`](crate::app::App::new).
//! It is never mutated afterwards; tests build their own instance with
//! [`Config::testing`] instead of flipping a flag on a shared app.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_BODY_LIMIT: usize = 1024 * 1024; // 1MB

/// Load environment variables from `.env` files if it exists.
///
/// Call this at the start of your application before accessing config.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Get a required environment variable.
///
/// Returns an error if the variable is not set.
pub fn get_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

/// Get an optional environment with a default value
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable.
pub fn get_env_parsed<T: FromStr>(key: &str) -> Result<T, ConfigError> {
    let value = get_env(key)?;
    value.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value,
    })
}

/// Get and parse an environment variable with a default.
pub fn get_env_parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`get_env_parsed`], but a missing variable yields `default`.
///
/// Unlike [`get_env_parsed_or`], a value that is present but unparsable
/// is reported instead of silently replaced.
fn get_env_parsed_opt<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match get_env_parsed(key) {
        Ok(value) => Ok(value),
        Err(ConfigError::Missing(_)) => Ok(default),
        Err(err) => Err(err),
    }
}

/// Runtime settings of the home page application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Testing mode. Disables panic recovery and error masking so failures
    /// surface in the test that caused them.
    pub testing: bool,
    pub host: String,
    pub port: u16,
    /// Shown in the home page title and heading.
    pub site_name: String,
    /// Maximum accepted request body size in bytes.
    pub body_limit: usize,
    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            testing: false,
            host: "127.0.0.1".to_string(),
            port: 3000,
            site_name: "Home".to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
            log_json: false,
        }
    }
}

impl Config {
    /// Default settings with testing mode on.
    pub fn testing() -> Self {
        Self {
            testing: true,
            ..Self::default()
        }
    }

    /// Loads settings from the environment, reading `.env` first.
    ///
    /// | Variable         | Field        |
    /// |------------------|--------------|
    /// | `APP_TESTING`    | `testing`    |
    /// | `APP_HOST`       | `host`       |
    /// | `APP_PORT`       | `port`       |
    /// | `APP_SITE_NAME`  | `site_name`  |
    /// | `APP_BODY_LIMIT` | `body_limit` |
    /// | `APP_LOG_JSON`   | `log_json`   |
    ///
    /// Unset variables keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_current_env()
    }

    /// Same as [`Config::from_env`] without touching `.env`.
    pub fn from_current_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            testing: get_env_parsed_opt("APP_TESTING", defaults.testing)?,
            host: get_env_or("APP_HOST", &defaults.host),
            port: get_env_parsed_opt("APP_PORT", defaults.port)?,
            site_name: get_env_or("APP_SITE_NAME", &defaults.site_name),
            body_limit: get_env_parsed_opt("APP_BODY_LIMIT", defaults.body_limit)?,
            log_json: get_env_parsed_opt("APP_LOG_JSON", defaults.log_json)?,
        })
    }

    /// The socket address to listen on.
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = format!("{}:{}", self.host, self.port);
        value.parse().map_err(|_| ConfigError::Invalid {
            key: "APP_HOST".to_string(),
            value: self.host.clone(),
        })
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Environment variable is not set.
    Missing(String),
    /// Environment variable value is invalid.
    Invalid { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => {
                write!(f, "Missing required environment variable '{}'", key)
            }
            ConfigError::Invalid { key, value } => {
                write!(
                    f,
                    "Invalid value '{}' for environment variable '{}' (failed to parse as expected type)",
                    value, key
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 6] = [
        "APP_TESTING",
        "APP_HOST",
        "APP_PORT",
        "APP_SITE_NAME",
        "APP_BODY_LIMIT",
        "APP_LOG_JSON",
    ];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: every test touching these variables is #[serial].
            unsafe { env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: every test touching these variables is #[serial].
        unsafe { env::set_var(key, value) };
    }

    #[test]
    fn test_get_env_missing() {
        let result = get_env("HOMEPAGE_TEST_MISSING_VAR_12345");
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_get_env_or_default() {
        let value = get_env_or("HOMEPAGE_TEST_MISSING_VAR_12345", "default");
        assert_eq!(value, "default");
    }

    #[test]
    fn test_get_env_parsed_or_default() {
        let value: u16 = get_env_parsed_or("HOMEPAGE_TEST_MISSING_VAR_12345", 3000);
        assert_eq!(value, 3000);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Missing("APP_PORT".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable 'APP_PORT'"
        );

        let err = ConfigError::Invalid {
            key: "APP_PORT".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'abc' for environment variable 'APP_PORT' (failed to parse as expected type)"
        );
    }

    #[test]
    fn test_default_is_not_testing() {
        let config = Config::default();
        assert!(!config.testing);
        assert_eq!(config.port, 3000);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn test_testing_only_flips_flag() {
        let config = Config::testing();
        assert!(config.testing);
        assert_eq!(
            Config {
                testing: false,
                ..config
            },
            Config::default()
        );
    }

    #[test]
    fn test_addr() {
        let addr = Config::default().addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_addr_invalid_host() {
        let config = Config {
            host: "not a host".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.addr(),
            Err(ConfigError::Invalid { key, .. }) if key == "APP_HOST"
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_current_env().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_values() {
        clear_env();
        set_env("APP_TESTING", "true");
        set_env("APP_PORT", "8080");
        set_env("APP_SITE_NAME", "Garden");
        set_env("APP_LOG_JSON", "true");

        let config = Config::from_current_env().unwrap();
        clear_env();

        assert!(config.testing);
        assert_eq!(config.port, 8080);
        assert_eq!(config.site_name, "Garden");
        assert!(config.log_json);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clear_env();
        set_env("APP_PORT", "eighty");

        let result = Config::from_current_env();
        clear_env();

        match result {
            Err(ConfigError::Invalid { key, value }) => {
                assert_eq!(key, "APP_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected invalid port, got {:?}", other),
        }
    }
}
