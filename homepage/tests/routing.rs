//! Integration tests for routing through the full middleware chain.

mod common;

use homepage::prelude::*;
use homepage::testing::TestClient;

#[tokio::test]
async fn test_home_route_is_get_only() {
    let client = common::client();
    let response = client.post("/").send().await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get("allow").unwrap(), "GET");
}

#[tokio::test]
async fn test_unknown_route() {
    let client = common::client();
    let response = client.get("/does-not-exist").send().await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_query_string_does_not_affect_matching() {
    let client = common::client();
    let response = client.get("/?ref=newsletter").send().await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_site_name_from_config() {
    let config = Config {
        site_name: "Tide & Table".to_string(),
        ..Config::testing()
    };
    let client = create_app(config).test_client();
    let response = client.get("/").send().await;

    assert!(response.text().contains("<h1>Tide &amp; Table</h1>"));
}

#[tokio::test]
async fn test_custom_routes_read_config_from_state() {
    let app = App::new(Config::testing()).router(Router::new().get(
        "/mode",
        |_, state: std::sync::Arc<homepage::state::AppState>| async move {
            match state.get::<Config>() {
                Some(config) if config.testing => "testing",
                _ => "production",
            }
        },
    ));

    let client = TestClient::new(app);
    let response = client.get("/mode").send().await;

    assert_eq!(response.text(), "testing");
}
