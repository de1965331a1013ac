//! In-process test client for the home page application.
//!
//! Requests issued through a [`TestClient`] go straight to the app's
//! middleware chain and router; no socket is opened.

mod client;

pub use client::{TestClient, TestRequestBuilder, TestResponse};
