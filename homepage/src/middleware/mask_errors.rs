use std::any::Any;
use std::panic::AssertUnwindSafe;

use bytes::Bytes;
use futures_util::FutureExt;
use http::{Request, Response};
use tracing::error;

use crate::context::RequestContext;
use crate::error::Error;
use crate::response::{BoxBody, IntoResponse};

use super::{BoxFuture, Middleware, Next};

const MASKED_MESSAGE: &str = "internal server error";

/// Production safeguard: recovers from handler panics and hides the
/// details of server errors.
///
/// Any panic below this layer becomes a 500 response. Every 5xx response
/// has its body replaced with a generic JSON error that only keeps the
/// trace id. Apps built with `testing = true` do not install it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskErrorsMiddleware;

impl MaskErrorsMiddleware {
    pub fn new() -> Self {
        Self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

impl Middleware for MaskErrorsMiddleware {
    fn handle<'a>(
        &'a self,
        req: Request<Bytes>,
        ctx: &'a RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response<BoxBody>> {
        Box::pin(async move {
            let status = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
                Ok(response) if !response.status().is_server_error() => return response,
                Ok(response) => response.status(),
                Err(payload) => {
                    error!(
                        trace_id = %ctx.trace_id,
                        panic = panic_message(payload.as_ref()),
                        "handler panicked"
                    );
                    http::StatusCode::INTERNAL_SERVER_ERROR
                }
            };

            let mut masked = Error::internal(MASKED_MESSAGE).with_trace_id(ctx.trace_id.clone());
            masked.status = status.as_u16();
            masked.into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewareStack;
    use crate::router::Router;
    use crate::state::AppState;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use std::sync::Arc;

    async fn run(router: Router, path: &str) -> Response<BoxBody> {
        let mut stack = MiddlewareStack::new();
        stack.add(MaskErrorsMiddleware::new());
        let state = Arc::new(AppState::new());
        let req = Request::get(path).body(Bytes::new()).unwrap();
        let ctx = RequestContext::with_trace_id("mask-trace".to_string());

        stack.execute(req, &router, &state, &ctx).await
    }

    async fn json(response: Response<BoxBody>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let router = Router::new().get("/", |_, _| async {
            if true {
                panic!("database exploded");
            }
            StatusCode::OK
        });

        let response = run(router, "/").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = json(response).await;
        assert_eq!(json["error"]["message"], MASKED_MESSAGE);
        assert_eq!(json["trace_id"], "mask-trace");
    }

    #[tokio::test]
    async fn test_server_error_details_hidden() {
        let router = Router::new().get("/", |_, _| async {
            Error::new(503, "UNAVAILABLE", "replica db-3 down")
        });

        let response = run(router, "/").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = json(response).await;
        assert_eq!(json["error"]["message"], MASKED_MESSAGE);
        assert!(!json.to_string().contains("db-3"));
    }

    #[tokio::test]
    async fn test_client_errors_pass_through() {
        let response = run(Router::new(), "/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
