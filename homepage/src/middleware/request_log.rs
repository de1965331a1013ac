use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use tracing::{Instrument, info, info_span, warn};

use crate::context::RequestContext;
use crate::response::BoxBody;

use super::{BoxFuture, Middleware, Next};

/// Opens a span per request and logs its outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogMiddleware;

impl RequestLogMiddleware {
    pub fn new() -> Self {
        Self
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Middleware for RequestLogMiddleware {
    fn handle<'a>(
        &'a self,
        req: Request<Bytes>,
        ctx: &'a RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response<BoxBody>> {
        let span = info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            trace_id = %ctx.trace_id,
        );

        Box::pin(
            async move {
                let response = next.run(req).await;
                let status = response.status().as_u16();
                let duration_ms = duration_ms(ctx.elapsed());

                if response.status().is_server_error() {
                    warn!(status, duration_ms, "request failed");
                } else {
                    info!(status, duration_ms, "request completed");
                }

                response
            }
            .instrument(span),
        )
    }
}
