//! Room broadcast behavior over real sockets.

use pretty_assertions::assert_eq;
use relay_server::domain::EchoPolicy;

use crate::common::TestApp;

/// Both members of a room receive a message, the sender included.
#[tokio::test]
async fn test_message_reaches_every_member_including_sender() {
    // Arrange
    let app = TestApp::spawn().await;
    let mut c1 = app.join("/ws/r", "r").await;
    let mut c2 = app.join("/ws/r", "r").await;

    // Act
    c1.send_message("hello").await;

    // Assert
    assert_eq!(c1.recv_message().await.as_deref(), Some("hello"));
    assert_eq!(c2.recv_message().await.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let app = TestApp::spawn().await;
    let mut c1 = app.join("/ws/r", "r").await;
    let mut c2 = app.join("/ws/s", "s").await;

    c1.send_message("x").await;

    assert_eq!(c1.recv_message().await.as_deref(), Some("x"));
    c2.expect_silence().await;
}

#[tokio::test]
async fn test_departed_member_receives_nothing() {
    let app = TestApp::spawn().await;
    let mut c1 = app.join("/ws/r", "r").await;
    let c2 = app.join("/ws/r", "r").await;

    c2.close().await;
    app.wait_for_members("r", 1).await;
    c1.send_message("y").await;

    assert_eq!(c1.recv_message().await.as_deref(), Some("y"));
    assert_eq!(app.member_count("r"), 1);
}

#[tokio::test]
async fn test_default_room_via_query_and_fallback() {
    let app = TestApp::spawn().await;
    let mut by_query = app.join("/ws?room=community_chatroom", "community_chatroom").await;
    let mut by_default = app.join("/ws", "community_chatroom").await;

    by_default.send_message("lobby").await;

    assert_eq!(by_query.recv_message().await.as_deref(), Some("lobby"));
    assert_eq!(by_default.recv_message().await.as_deref(), Some("lobby"));
}

#[tokio::test]
async fn test_messages_from_one_sender_arrive_in_order() {
    let app = TestApp::spawn().await;
    let mut sender = app.join("/ws/ordered", "ordered").await;
    let mut receiver = app.join("/ws/ordered", "ordered").await;

    for i in 0..20 {
        sender.send_message(&format!("m{}", i)).await;
    }

    for i in 0..20 {
        assert_eq!(receiver.recv_message().await, Some(format!("m{}", i)));
    }
}

#[tokio::test]
async fn test_exclude_sender_policy() {
    let app = TestApp::spawn_with(|s| s.relay.echo_policy = EchoPolicy::ExcludeSender).await;
    let mut c1 = app.join("/ws/r", "r").await;
    let mut c2 = app.join("/ws/r", "r").await;

    c1.send_message("quiet").await;

    assert_eq!(c2.recv_message().await.as_deref(), Some("quiet"));
    c1.expect_silence().await;
}

#[tokio::test]
async fn test_fixed_room_ignores_requested_room() {
    let app = TestApp::spawn_with(|s| s.relay.allow_room_selection = false).await;
    let mut c1 = app.join("/ws/elsewhere", "community_chatroom").await;
    let mut c2 = app.join("/ws", "community_chatroom").await;

    c1.send_message("same room").await;

    assert_eq!(c2.recv_message().await.as_deref(), Some("same room"));
    assert_eq!(app.member_count("elsewhere"), 0);
}

#[tokio::test]
async fn test_malformed_frame_is_dropped_without_closing() {
    let app = TestApp::spawn().await;
    let mut c1 = app.join("/ws/r", "r").await;

    c1.send_raw("not json").await;
    c1.send_raw(r#"{"message":"ok","extra":1}"#).await;
    c1.send_message("still here").await;

    assert_eq!(c1.recv_message().await.as_deref(), Some("still here"));
}

#[tokio::test]
async fn test_array_frame_is_not_relayed() {
    let app = TestApp::spawn().await;
    let mut c1 = app.join("/ws/r", "r").await;
    let mut c2 = app.join("/ws/r", "r").await;

    c1.send_raw(r#"["smuggled"]"#).await;
    c1.send_message("real").await;

    assert_eq!(c2.recv_message().await.as_deref(), Some("real"));
    assert_eq!(c1.recv_message().await.as_deref(), Some("real"));
}

#[tokio::test]
async fn test_array_frame_counts_toward_protocol_error_limit() {
    let app = TestApp::spawn_with(|s| s.relay.max_protocol_errors = 1).await;
    let mut c1 = app.join("/ws/r", "r").await;
    let mut c2 = app.join("/ws/r", "r").await;

    c1.send_raw(r#"["smuggled"]"#).await;

    assert_eq!(c1.recv_close_code().await, Some(1008));
    c2.expect_silence().await;
    app.wait_for_members("r", 1).await;
}
