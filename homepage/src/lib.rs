pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod response;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;
pub mod testing;

use crate::app::App;
use crate::config::Config;

/// Builds the home page application with the given configuration.
///
/// The configuration is fixed for the lifetime of the returned [`App`].
/// Tests pass [`Config::testing`] to get an app with production safeguards
/// turned off.
pub fn create_app(config: Config) -> App {
    App::new(config).router(routes::routes())
}

pub mod prelude {
    pub use crate::app::App;
    pub use crate::config::Config;
    pub use crate::context::RequestContext;
    pub use crate::create_app;
    pub use crate::error::{Error, Result};
    pub use crate::middleware::{Middleware, Next};
    pub use crate::observability::TracingConfig;
    pub use crate::response::{Html, IntoResponse};
    pub use crate::router::Router;

    pub use http::{Method, StatusCode};
    pub use serde::{Deserialize, Serialize};
}
