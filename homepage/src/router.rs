//! Request routing.
//!
//! The [`Router`] maps a method and an exact path to a handler. There are
//! no path parameters or wildcards.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, HeaderValue};
use http::{Method, Request, Response};

use crate::context::RequestContext;
use crate::error::Error;
use crate::response::{BoxBody, IntoResponse};
use crate::state::AppState;

type BoxFuture = Pin<Box<dyn Future<Output = Response<BoxBody>> + Send>>;
type HandlerFn = Box<dyn Fn(Request<Bytes>, Arc<AppState>) -> BoxFuture + Send + Sync>;

pub(crate) struct Route {
    pub(crate) path: String,
    handler: HandlerFn,
}

/// Maps requests to handlers.
///
/// # Examples
///
/// ```
/// use homepage::prelude::*;
///
/// let router = Router::new()
///     .get("/", |_, _| async { Html("<h1>Home</h1>") })
///     .post("/contact", |_, _| async { StatusCode::ACCEPTED });
/// ```
pub struct Router {
    pub(crate) routes: Vec<(Method, Route)>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route with the given HTTP method and path.
    ///
    /// When the same method and path are registered twice, the first
    /// registration wins.
    pub fn route<F, Fut, Out>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, Arc<AppState>) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        let handler = Box::new(move |req: Request<Bytes>, state: Arc<AppState>| {
            let handler = handler.clone();
            Box::pin(async move { handler(req, state).await.into_response() }) as BoxFuture
        });

        self.routes.push((
            method,
            Route {
                path: path.to_string(),
                handler,
            },
        ));
        self
    }

    pub fn get<F, Fut, Out>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, Arc<AppState>) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F, Fut, Out>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, Arc<AppState>) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Dispatches a request to the matching handler.
    ///
    /// Returns 404 when no route has the path and 405, with an `Allow`
    /// header, when the path exists under other methods only.
    pub async fn handle(&self, req: Request<Bytes>, state: &Arc<AppState>) -> Response<BoxBody> {
        let path = req.uri().path().to_string();
        let mut allowed: Vec<&Method> = Vec::new();

        for (method, route) in &self.routes {
            if route.path != path {
                continue;
            }
            if method == req.method() {
                return (route.handler)(req, state.clone()).await;
            }
            if !allowed.contains(&method) {
                allowed.push(method);
            }
        }

        let trace_id = req
            .extensions()
            .get::<RequestContext>()
            .map(|ctx| ctx.trace_id.clone());

        if allowed.is_empty() {
            let err = Error::not_found(format!("no route for {}", path));
            return with_trace_id(err, trace_id).into_response();
        }

        let allow = allowed
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let err = Error::method_not_allowed(format!("{} is not allowed on {}", req.method(), path));
        let mut response = with_trace_id(err, trace_id).into_response();
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(ALLOW, value);
        }
        response
    }
}

fn with_trace_id(err: Error, trace_id: Option<String>) -> Error {
    match trace_id {
        Some(id) => err.with_trace_id(id),
        None => err,
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
