use bytes::Bytes;
use http::header::HeaderValue;
use http::{Request, Response};

use crate::context::{RequestContext, TRACE_ID_HEADER};
use crate::response::BoxBody;

use super::{BoxFuture, Middleware, Next};

/// Echoes the request's trace id on the response as `x-trace-id`.
///
/// The id itself is chosen when the [`RequestContext`] is built: an
/// incoming `x-trace-id` is kept, otherwise a new one is generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceIdMiddleware;

impl TraceIdMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for TraceIdMiddleware {
    fn handle<'a>(
        &'a self,
        req: Request<Bytes>,
        ctx: &'a RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response<BoxBody>> {
        Box::pin(async move {
            let mut response = next.run(req).await;

            if let Ok(value) = HeaderValue::from_str(&ctx.trace_id) {
                response.headers_mut().insert(TRACE_ID_HEADER, value);
            }

            response
        })
    }
}
