//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum_test::TestServer;
use futures::{SinkExt, StreamExt};
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest, http::HeaderValue, Error as WsError, Message,
};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use relay_server::config::Settings;
use relay_server::domain::RoomName;
use relay_server::infrastructure::identity::Claims;
use relay_server::startup::{build_router, AppState, Application};

/// How long to wait for a frame that should arrive.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before concluding a frame will not arrive.
pub const SILENCE: Duration = Duration::from_millis(200);

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

/// Settings for tests: loopback, ephemeral port.
pub fn test_settings() -> Settings {
    let mut settings = Settings::defaults().expect("default settings are valid");
    settings.server.host = "127.0.0.1".into();
    settings.server.port = 0;
    settings
}

/// In-process router for plain HTTP tests
pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state)).expect("failed to build test server")
}

/// Signed token for `sub`, valid for an hour.
pub fn token_for(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("failed to sign token")
}

/// A relay server running on a real socket
pub struct TestApp {
    pub address: SocketAddr,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<anyhow::Result<()>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = test_settings();
        configure(&mut settings);

        let app = Application::build(settings)
            .await
            .expect("failed to build application");
        let address = app.local_addr().expect("no local address");
        let state = app.state().clone();

        let (shutdown, signal) = oneshot::channel::<()>();
        let server = tokio::spawn(app.run_until(async move {
            let _ = signal.await;
        }));

        Self {
            address,
            state,
            shutdown: Some(shutdown),
            server,
        }
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.address, path)
    }

    /// Connect and wait until the server has joined the client to `room`.
    pub async fn join(&self, path: &str, room: &str) -> WsClient {
        let before = self.member_count(room);
        let client = self.connect(path).await.expect("handshake failed");
        self.wait_for_members(room, before + 1).await;
        client
    }

    pub async fn connect(&self, path: &str) -> Result<WsClient, WsError> {
        let (stream, _) = connect_async(self.ws_url(path)).await?;
        Ok(WsClient { stream })
    }

    pub async fn connect_with_bearer(&self, path: &str, token: &str) -> Result<WsClient, WsError> {
        let mut request = self.ws_url(path).into_client_request()?;
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header"),
        );
        let (stream, _) = connect_async(request).await?;
        Ok(WsClient { stream })
    }

    pub fn member_count(&self, room: &str) -> usize {
        let room = RoomName::parse(room).expect("valid room name");
        self.state.gateway.registry().member_count(&room)
    }

    /// Poll until `room` has exactly `expected` members.
    pub async fn wait_for_members(&self, room: &str, expected: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.member_count(room) != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "room {} has {} members, expected {}",
                room,
                self.member_count(room),
                expected
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Fire the shutdown signal and wait for the server to stop.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = tokio::time::timeout(RECV_TIMEOUT, &mut self.server).await;
    }
}

/// Minimal relay client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn send_message(&mut self, message: &str) {
        let frame = serde_json::json!({ "message": message }).to_string();
        self.send_raw(&frame).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("failed to send frame");
    }

    /// Next relayed payload, or `None` on timeout or any non-text frame.
    pub async fn recv_message(&mut self) -> Option<String> {
        self.recv_message_within(RECV_TIMEOUT).await
    }

    async fn recv_message_within(&mut self, wait: Duration) -> Option<String> {
        loop {
            let frame = tokio::time::timeout(wait, self.stream.next()).await.ok()??;
            match frame.ok()? {
                Message::Text(text) => {
                    let value: serde_json::Value = serde_json::from_str(text.as_str()).ok()?;
                    return value["message"].as_str().map(String::from);
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                _ => return None,
            }
        }
    }

    /// Assert nothing is relayed for a short while.
    pub async fn expect_silence(&mut self) {
        if let Some(message) = self.recv_message_within(SILENCE).await {
            panic!("expected no message, got {:?}", message);
        }
    }

    /// Code of the close frame the server sends, skipping relayed messages.
    pub async fn recv_close_code(&mut self) -> Option<u16> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .ok()??;
            match frame {
                Ok(Message::Close(frame)) => return frame.map(|f| u16::from(f.code)),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// HTTP status of a rejected handshake.
pub fn rejected_status(result: Result<WsClient, WsError>) -> u16 {
    match result {
        Err(WsError::Http(response)) => response.status().as_u16(),
        Err(other) => panic!("expected HTTP rejection, got {:?}", other),
        Ok(_) => panic!("expected handshake to be rejected"),
    }
}
