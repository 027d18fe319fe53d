//! Connection close paths.

use pretty_assertions::assert_eq;

use crate::common::TestApp;

#[tokio::test]
async fn test_repeated_protocol_errors_close_connection() {
    let app = TestApp::spawn_with(|s| s.relay.max_protocol_errors = 2).await;
    let mut client = app.join("/ws/r", "r").await;

    client.send_raw("{}").await;
    client.send_raw(r#"["hello"]"#).await;

    assert_eq!(client.recv_close_code().await, Some(1008));
    app.wait_for_members("r", 0).await;
}

#[tokio::test]
async fn test_shutdown_closes_every_connection() {
    let app = TestApp::spawn().await;
    let mut c1 = app.join("/ws/r", "r").await;
    let mut c2 = app.join("/ws/s", "s").await;
    let state = app.state.clone();

    app.shutdown().await;

    assert_eq!(c1.recv_close_code().await, Some(1001));
    assert_eq!(c2.recv_close_code().await, Some(1001));
    assert!(!state.gateway.is_accepting());
    assert_eq!(state.gateway.registry().room_count(), 0);
}

#[tokio::test]
async fn test_client_close_releases_connection() {
    let app = TestApp::spawn().await;
    let client = app.join("/ws/r", "r").await;
    assert_eq!(app.state.gateway.connection_count(), 1);

    client.close().await;
    app.wait_for_members("r", 0).await;

    let deadline = tokio::time::Instant::now() + crate::common::RECV_TIMEOUT;
    while app.state.gateway.connection_count() > 0 {
        assert!(tokio::time::Instant::now() < deadline, "connection not released");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(app.state.gateway.registry().room_count(), 0);
}
