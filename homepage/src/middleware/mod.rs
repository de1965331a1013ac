mod body_limit;
mod mask_errors;
mod request_log;
mod trace_id;

pub use body_limit::{BodyLimitMiddleware, BodyRejection};
pub use mask_errors::MaskErrorsMiddleware;
pub use request_log::RequestLogMiddleware;
pub use trace_id::TraceIdMiddleware;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};

use crate::context::RequestContext;
use crate::response::BoxBody;
use crate::router::Router;
use crate::state::AppState;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A layer wrapped around the router.
///
/// Middlewares run in registration order; each one decides whether and how
/// to call the rest of the chain through [`Next::run`].
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(
        &'a self,
        req: Request<Bytes>,
        ctx: &'a RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response<BoxBody>>;
}

pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    router: &'a Router,
    state: &'a Arc<AppState>,
    ctx: &'a RequestContext,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        middlewares: &'a [Arc<dyn Middleware>],
        router: &'a Router,
        state: &'a Arc<AppState>,
        ctx: &'a RequestContext,
    ) -> Self {
        Self {
            middlewares,
            router,
            state,
            ctx,
        }
    }

    pub async fn run(self, req: Request<Bytes>) -> Response<BoxBody> {
        if let Some((current, rest)) = self.middlewares.split_first() {
            let next = Next {
                middlewares: rest,
                router: self.router,
                state: self.state,
                ctx: self.ctx,
            };
            current.handle(req, self.ctx, next).await
        } else {
            self.router.handle(req, self.state).await
        }
    }
}

pub struct MiddlewareStack {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Appends every middleware of `other` after the current ones.
    pub fn extend(&mut self, other: MiddlewareStack) {
        self.middlewares.extend(other.middlewares);
    }

    pub async fn execute(
        &self,
        req: Request<Bytes>,
        router: &Router,
        state: &Arc<AppState>,
        ctx: &RequestContext,
    ) -> Response<BoxBody> {
        let next = Next::new(&self.middlewares, router, state, ctx);
        next.run(req).await
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl Default for MiddlewareStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http::header::HeaderValue;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn handle<'a>(
            &'a self,
            req: Request<Bytes>,
            _ctx: &'a RequestContext,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response<BoxBody>> {
            Box::pin(async move {
                let mut response = next.run(req).await;
                let order = match response.headers().get("x-order") {
                    Some(v) => format!("{},{}", v.to_str().unwrap_or(""), self.0),
                    None => self.0.to_string(),
                };
                response
                    .headers_mut()
                    .insert("x-order", HeaderValue::from_str(&order).unwrap());
                response
            })
        }
    }

    #[tokio::test]
    async fn test_stack_runs_in_registration_order() {
        let mut stack = MiddlewareStack::new();
        stack.add(Tag("outer"));
        stack.add(Tag("inner"));

        let router = Router::new().get("/", |_, _| async { StatusCode::OK });
        let state = Arc::new(AppState::new());
        let req = Request::get("/").body(Bytes::new()).unwrap();

        let response = stack
            .execute(req, &router, &state, &RequestContext::new())
            .await;

        // inner sees the response first
        assert_eq!(response.headers().get("x-order").unwrap(), "inner,outer");
    }

    #[test]
    fn test_stack_extend() {
        let mut first = MiddlewareStack::new();
        first.add(Tag("a"));
        let mut second = MiddlewareStack::new();
        second.add(Tag("b"));
        second.add(Tag("c"));

        first.extend(second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_stack_default_is_empty() {
        assert!(MiddlewareStack::default().is_empty());
    }
}
