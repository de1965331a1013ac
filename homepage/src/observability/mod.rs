//! Logging setup for the home page application.

mod tracing;

pub use self::tracing::TracingConfig;
