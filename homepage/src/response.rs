//! Response types and conversion traits.
//!
//! Handlers return anything implementing [`IntoResponse`]: strings, status
//! codes, [`Html`] pages, [`Error`](crate::error::Error) values, or a
//! `Result` of those.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::Full;

/// The body type used for HTTP responses.
pub type BoxBody = Full<Bytes>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Trait for types that can be converted into an HTTP response.
///
/// # Examples
///
/// ```
/// use homepage::response::{BoxBody, IntoResponse};
/// use http::Response;
///
/// struct Greeting {
///     name: String,
/// }
///
/// impl IntoResponse for Greeting {
///     fn into_response(self) -> Response<BoxBody> {
///         format!("hello, {}", self.name).into_response()
///     }
/// }
/// ```
pub trait IntoResponse {
    fn into_response(self) -> Response<BoxBody>;
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<BoxBody> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// An HTML page.
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T: Into<String>> IntoResponse for Html<T> {
    fn into_response(self) -> Response<BoxBody> {
        with_body(StatusCode::OK, TEXT_HTML, Bytes::from(self.0.into()))
    }
}

impl IntoResponse for Response<BoxBody> {
    fn into_response(self) -> Response<BoxBody> {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response<BoxBody> {
        with_body(StatusCode::OK, TEXT_PLAIN, Bytes::from_static(self.as_bytes()))
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response<BoxBody> {
        with_body(StatusCode::OK, TEXT_PLAIN, Bytes::from(self))
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response<BoxBody> {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = self;
        response
    }
}

impl IntoResponse for (StatusCode, String) {
    fn into_response(self) -> Response<BoxBody> {
        with_body(self.0, TEXT_PLAIN, Bytes::from(self.1))
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for std::result::Result<T, E> {
    fn into_response(self) -> Response<BoxBody> {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}
