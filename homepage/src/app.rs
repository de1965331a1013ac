//! The application handle and its frozen, shareable form.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use http::{Request, Response};
use tracing::info;

use crate::config::Config;
use crate::context::RequestContext;
use crate::middleware::{
    BodyLimitMiddleware, MaskErrorsMiddleware, Middleware, MiddlewareStack, RequestLogMiddleware,
    TraceIdMiddleware,
};
use crate::observability::TracingConfig;
use crate::response::BoxBody;
use crate::router::Router;
use crate::server::{serve, shutdown_signal};
use crate::state::AppState;
use crate::testing::TestClient;

/// A configured web application.
///
/// The [`Config`] is fixed at construction and also stored in the
/// [`AppState`] so handlers can read it.
///
/// # Examples
///
/// ```
/// use homepage::prelude::*;
///
/// let app = App::new(Config::testing())
///     .router(Router::new().get("/", |_, _| async { "hello" }));
/// assert!(app.is_testing());
/// ```
pub struct App {
    config: Config,
    router: Router,
    state: AppState,
    middlewares: MiddlewareStack,
    tracing: Option<TracingConfig>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            state: AppState::new().with(config.clone()),
            config,
            router: Router::new(),
            middlewares: MiddlewareStack::new(),
            tracing: None,
        }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Shares `value` with handlers. A [`Config`] value is ignored; the
    /// configuration given to [`App::new`] cannot be replaced.
    pub fn state<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.state = self.state.with(value).with(self.config.clone());
        self
    }

    /// Adds a middleware. User middlewares run inside the built-in ones.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.add(middleware);
        self
    }

    /// Installs a tracing subscriber when the app starts listening.
    pub fn with_tracing(mut self, config: TracingConfig) -> Self {
        self.tracing = Some(config);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_testing(&self) -> bool {
        self.config.testing
    }

    /// Freezes the app into a [`Service`].
    ///
    /// The middleware chain is, from the outside in: trace id, request log,
    /// error masking (outside testing mode only), body limit, then the
    /// user middlewares.
    pub fn into_service(self) -> Arc<Service> {
        let mut middlewares = MiddlewareStack::new();
        middlewares.add(TraceIdMiddleware::new());
        middlewares.add(RequestLogMiddleware::new());
        if !self.config.testing {
            middlewares.add(MaskErrorsMiddleware::new());
        }
        middlewares.add(BodyLimitMiddleware::new(self.config.body_limit));
        middlewares.extend(self.middlewares);

        Arc::new(Service {
            config: self.config,
            router: self.router,
            state: Arc::new(self.state),
            middlewares,
            active_clients: AtomicUsize::new(0),
        })
    }

    /// Acquires an in-process client for this app.
    ///
    /// The client is released when it is dropped.
    pub fn test_client(self) -> TestClient {
        TestClient::new(self)
    }

    /// Serves the app on [`Config::addr`] until Ctrl-C is received.
    pub async fn listen(self) -> std::io::Result<()> {
        if let Some(tracing) = self.tracing.clone() {
            tracing.try_init();
        }

        let addr = self
            .config
            .addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let service = self.into_service();
        info!(%addr, testing = service.config.testing, "starting server");

        serve(service, addr, shutdown_signal(tokio::signal::ctrl_c())).await
    }
}

/// A frozen app, shared between the server's connections and test clients.
pub struct Service {
    config: Config,
    router: Router,
    state: Arc<AppState>,
    middlewares: MiddlewareStack,
    active_clients: AtomicUsize,
}

impl Service {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one request through the middleware chain and the router.
    pub async fn dispatch(&self, mut req: Request<Bytes>) -> Response<BoxBody> {
        let ctx = RequestContext::from_headers(req.headers());
        req.extensions_mut().insert(ctx.clone());

        self.middlewares
            .execute(req, &self.router, &self.state, &ctx)
            .await
    }

    /// Number of [`TestClient`]s currently holding this service.
    pub fn active_clients(&self) -> usize {
        self.active_clients.load(Ordering::SeqCst)
    }

    pub(crate) fn acquire_client(&self) -> usize {
        self.active_clients.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn release_client(&self) -> usize {
        self.active_clients.fetch_sub(1, Ordering::SeqCst) - 1
    }
}
