use crate::common::{TestClient, TestStateBuilder};
use axum::http::StatusCode;

#[tokio::test]
async fn test_health_check() {
    let state = TestStateBuilder::new().build_lazy();
    let client = TestClient::for_state(&state);

    let response = client.get("/health").await;

    response.assert_status(StatusCode::OK);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let state = TestStateBuilder::new().build_lazy();
    let client = TestClient::for_state(&state);

    let response = client.get("/does-not-exist").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_readiness_with_database() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);

    client.get("/health/ready").await.assert_status(StatusCode::OK);
}
