use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::app::{App, Service};

/// A scoped client bound to one application.
///
/// Creating a client freezes the app and registers the client with the
/// resulting [`Service`]; dropping it releases that registration, also when
/// the owning test panics.
///
/// # Examples
///
/// ```
/// use homepage::prelude::*;
/// use homepage::testing::TestClient;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = TestClient::new(create_app(Config::testing()));
/// let response = client.get("/").send().await;
///
/// assert_eq!(response.status(), StatusCode::OK);
/// assert!(!response.text().is_empty());
/// # }
/// ```
pub struct TestClient {
    service: Arc<Service>,
}

impl TestClient {
    pub fn new(app: App) -> Self {
        Self::from_service(app.into_service())
    }

    /// Attaches a new client to an existing service.
    pub fn from_service(service: Arc<Service>) -> Self {
        let active = service.acquire_client();
        debug!(active, "test client acquired");
        Self { service }
    }

    pub fn get(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(Method::DELETE, path)
    }

    pub fn patch(&self, path: &str) -> TestRequestBuilder<'_> {
        self.request(Method::PATCH, path)
    }

    pub fn request(&self, method: Method, path: &str) -> TestRequestBuilder<'_> {
        TestRequestBuilder::new(self, method, path)
    }

    /// The service this client dispatches to.
    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }
}

impl Drop for TestClient {
    fn drop(&mut self) {
        let active = self.service.release_client();
        debug!(active, "test client released");
    }
}

/// Builder for a single request.
pub struct TestRequestBuilder<'a> {
    client: &'a TestClient,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl<'a> TestRequestBuilder<'a> {
    fn new(client: &'a TestClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Adds a header.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is not a valid header.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(key.as_bytes())
            .unwrap_or_else(|_| panic!("invalid header name {:?}", key));
        let value = HeaderValue::from_str(value)
            .unwrap_or_else(|_| panic!("invalid header value {:?}", value));
        self.headers.insert(name, value);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Bytes::from(serde_json::to_vec(body).expect("body serializes to JSON"));
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self
    }

    /// Sets a form body.
    pub fn form<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Bytes::from(
            serde_urlencoded::to_string(body).expect("body serializes to a form"),
        );
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Dispatches the request in-process and collects the response.
    ///
    /// In testing mode a panicking handler is not caught: the panic
    /// continues through this call into the test.
    pub async fn send(self) -> TestResponse {
        let mut request = Request::builder()
            .method(self.method)
            .uri(&self.path)
            .body(self.body)
            .unwrap_or_else(|e| panic!("invalid request for {:?}: {}", self.path, e));
        *request.headers_mut() = self.headers;

        let response = self.client.service.dispatch(request).await;

        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes the response body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        self.try_json()
            .unwrap_or_else(|e| panic!("response body is not the expected JSON: {}", e))
    }

    pub fn try_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
