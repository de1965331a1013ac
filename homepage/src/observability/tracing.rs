use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;

/// Configuration for the tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over [`TracingConfig::level`].
///
/// # Examples
///
/// ```no_run
/// use homepage::prelude::*;
///
/// # async fn run() -> std::io::Result<()> {
/// create_app(Config::default())
///     .with_tracing(TracingConfig::new().json())
///     .listen()
///     .await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub json: bool,
    pub level: Level,
    /// Include the target (module path) in logs.
    pub with_target: bool,
    pub with_file: bool,
    pub with_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: Level::INFO,
            with_target: true,
            with_file: false,
            with_line_number: false,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives logging settings from the app configuration.
    ///
    /// Testing mode logs at `DEBUG` with file and line information.
    pub fn from_config(config: &Config) -> Self {
        let base = if config.log_json {
            Self::new().json()
        } else {
            Self::new()
        };

        if config.testing {
            base.level(Level::DEBUG)
                .with_file(true)
                .with_line_number(true)
        } else {
            base
        }
    }

    /// Enables JSON output format.
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` when a subscriber was already installed, which
    /// happens when several tests in one binary each build an app.
    pub fn try_init(self) -> bool {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string()));

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(self.with_target)
            .with_file(self.with_file)
            .with_line_number(self.with_line_number);

        if self.json {
            builder.json().try_init().is_ok()
        } else {
            builder.try_init().is_ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert!(!config.json);
        assert_eq!(config.level, Level::INFO);
        assert!(config.with_target);
        assert!(!config.with_file);
        assert!(!config.with_line_number);
    }

    #[test]
    fn test_tracing_config_builder_chain() {
        let config = TracingConfig::new()
            .json()
            .level(Level::TRACE)
            .with_target(false)
            .with_file(true)
            .with_line_number(true);

        assert!(config.json);
        assert_eq!(config.level, Level::TRACE);
        assert!(!config.with_target);
        assert!(config.with_file);
        assert!(config.with_line_number);
    }

    #[test]
    fn test_from_config_production() {
        let config = TracingConfig::from_config(&Config {
            log_json: true,
            ..Config::default()
        });
        assert!(config.json);
        assert_eq!(config.level, Level::INFO);
        assert!(!config.with_file);
    }

    #[test]
    fn test_from_config_testing() {
        let config = TracingConfig::from_config(&Config::testing());
        assert!(!config.json);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.with_file);
        assert!(config.with_line_number);
    }

    #[test]
    fn test_try_init_twice() {
        let _ = TracingConfig::new().try_init();
        assert!(!TracingConfig::new().try_init());
    }
}
