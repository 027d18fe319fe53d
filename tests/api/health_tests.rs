//! Health Check API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use relay_server::startup::AppState;

use crate::common::{test_server, test_settings};

/// Test basic health check endpoint returns 200 OK
#[tokio::test]
async fn test_health_check_returns_ok() {
    // Arrange
    let server = test_server(AppState::new(test_settings()));

    // Act
    let response = server.get("/health").await;

    // Assert
    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
}

/// Test liveness probe endpoint
#[tokio::test]
async fn test_liveness_probe() {
    let server = test_server(AppState::new(test_settings()));

    let response = server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["status"], "alive");
}

/// Test readiness probe reports relay state
#[tokio::test]
async fn test_readiness_probe() {
    let server = test_server(AppState::new(test_settings()));

    let response = server.get("/health/ready").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["relay"]["accepting"], true);
    assert_eq!(json["checks"]["relay"]["active_connections"], 0);
    assert_eq!(json["checks"]["relay"]["active_rooms"], 0);
}

/// Readiness fails once the gateway is shutting down
#[tokio::test]
async fn test_readiness_fails_during_shutdown() {
    let state = AppState::new(test_settings());
    let server = test_server(state.clone());

    state.gateway.shutdown();
    let response = server.get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<serde_json::Value>()["status"], "unhealthy");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = test_server(AppState::new(test_settings()));
    relay_server::infrastructure::metrics::set_websocket_connections(0);

    let response = server.get("/metrics").await;

    response.assert_status_ok();
    assert!(response
        .text()
        .contains("relay_server_websocket_connections_active"));
}
