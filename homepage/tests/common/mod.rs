//! Shared fixture for the integration tests.

use homepage::config::Config;
use homepage::create_app;
use homepage::testing::TestClient;

/// A client bound to a freshly built app in testing mode.
///
/// Every call builds its own app, so tests never share configuration.
/// The client is released when the test drops it, whether it passes or
/// panics.
pub fn client() -> TestClient {
    create_app(Config::testing()).test_client()
}
