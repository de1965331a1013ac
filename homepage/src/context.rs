use std::time::{Duration, Instant};

use http::HeaderMap;

/// Header carrying the trace id in both directions.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Per-request data shared by middlewares and handlers.
///
/// A context is created for every dispatched request and stored in the
/// request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: String,
    pub start_time: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_trace_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_trace_id(trace_id: String) -> Self {
        Self {
            trace_id,
            start_time: Instant::now(),
        }
    }

    /// Reuses the caller's `x-trace-id` when it is valid text, otherwise
    /// generates a fresh id.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|id| Self::with_trace_id(id.to_string()))
            .unwrap_or_default()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
