//! Handshake admission and rejection.

use pretty_assertions::assert_eq;

use crate::common::{rejected_status, token_for, TestApp, TEST_JWT_SECRET};

#[tokio::test]
async fn test_invalid_room_name_is_rejected() {
    let app = TestApp::spawn().await;

    let status = rejected_status(app.connect("/ws/bad%20room").await);

    assert_eq!(status, 400);
    assert_eq!(app.state.gateway.connection_count(), 0);
}

#[tokio::test]
async fn test_overlong_room_name_is_rejected() {
    let app = TestApp::spawn().await;
    let path = format!("/ws/{}", "a".repeat(100));

    assert_eq!(rejected_status(app.connect(&path).await), 400);
}

#[tokio::test]
async fn test_required_identity_rejects_anonymous() {
    let app = TestApp::spawn_with(|s| {
        s.auth.jwt_secret = Some(TEST_JWT_SECRET.into());
        s.auth.require_identity = true;
    })
    .await;

    assert_eq!(rejected_status(app.connect("/ws/r").await), 401);
    assert_eq!(rejected_status(app.connect("/ws/r?token=garbage").await), 401);
    assert_eq!(app.member_count("r"), 0);
}

#[tokio::test]
async fn test_valid_token_is_admitted() {
    let app = TestApp::spawn_with(|s| {
        s.auth.jwt_secret = Some(TEST_JWT_SECRET.into());
        s.auth.require_identity = true;
    })
    .await;
    let token = token_for("user-1");

    let mut by_header = app
        .connect_with_bearer("/ws/r", &token)
        .await
        .expect("bearer header accepted");
    let _by_query = app
        .connect(&format!("/ws/r?token={}", token))
        .await
        .expect("token query accepted");
    app.wait_for_members("r", 2).await;

    by_header.send_message("authenticated").await;
    assert_eq!(by_header.recv_message().await.as_deref(), Some("authenticated"));
}

#[tokio::test]
async fn test_connection_cap() {
    let app = TestApp::spawn_with(|s| s.relay.max_connections = 1).await;
    let _first = app.join("/ws/r", "r").await;

    assert_eq!(rejected_status(app.connect("/ws/r").await), 503);
}
