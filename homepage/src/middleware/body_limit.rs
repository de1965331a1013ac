use bytes::Bytes;
use http::{Request, Response};

use crate::context::RequestContext;
use crate::error::Error;
use crate::response::{BoxBody, IntoResponse};

use super::{BoxFuture, Middleware, Next};

/// Marks a request whose body the server could not collect.
///
/// The server dispatches such requests with an empty body so the rejection
/// goes through the whole middleware chain; [`BodyLimitMiddleware`]
/// answers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRejection {
    /// The body exceeded the configured limit.
    TooLarge,
    /// Reading the body failed.
    Unreadable,
}

/// Rejects requests whose body exceeds `max_size` bytes with 413.
pub struct BodyLimitMiddleware {
    pub(crate) max_size: usize,
}

impl BodyLimitMiddleware {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    fn too_large(&self) -> Error {
        Error::payload_too_large(format!("request body exceeds {} bytes", self.max_size))
    }
}

impl Middleware for BodyLimitMiddleware {
    fn handle<'a>(
        &'a self,
        req: Request<Bytes>,
        ctx: &'a RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response<BoxBody>> {
        Box::pin(async move {
            let rejection = match req.extensions().get::<BodyRejection>() {
                Some(BodyRejection::TooLarge) => Some(self.too_large()),
                Some(BodyRejection::Unreadable) => Some(Error::bad_request("failed to read body")),
                None => {
                    let declared = req
                        .headers()
                        .get(http::header::CONTENT_LENGTH)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<usize>().ok());

                    let actual = req.body().len();
                    if actual > self.max_size || declared.is_some_and(|len| len > self.max_size) {
                        Some(self.too_large())
                    } else {
                        None
                    }
                }
            };

            match rejection {
                Some(err) => err.with_trace_id(ctx.trace_id.clone()).into_response(),
                None => next.run(req).await,
            }
        })
    }
}
