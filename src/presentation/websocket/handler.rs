//! WebSocket Connection Handler
//!
//! Upgrades admitted clients and runs the reader and writer of each
//! connection until it closes.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use futures::{SinkExt, Stream, StreamExt};
use tokio::time::timeout;

use super::gateway::{Admission, Gateway};
use super::messages::{encode_outbound, InboundFrame};
use super::session::SessionState;
use crate::application::{BroadcastHub, CloseReason, Connection};
use crate::domain::ConnectContext;
use crate::infrastructure::metrics;
use crate::shared::error::{AppError, RelayError};
use crate::startup::AppState;

/// How long the writer may take to flush its close frame.
const WRITER_GRACE: Duration = Duration::from_secs(2);

/// `GET /ws`: room from `?room=`, or the default room.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let ctx = connect_context(&headers, query, None);
    upgrade(ws, state, ctx).await
}

/// `GET /ws/{room}`: room from the path.
pub async fn ws_room_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let ctx = connect_context(&headers, query, Some(room));
    upgrade(ws, state, ctx).await
}

/// Build the connect context. The `Authorization` header wins over the
/// `token` query parameter, the path room over the `room` query parameter.
fn connect_context(
    headers: &HeaderMap,
    mut query: HashMap<String, String>,
    path_room: Option<String>,
) -> ConnectContext {
    let header_token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    let query_token = query.remove("token");
    let query_room = query.remove("room");

    ConnectContext {
        bearer_token: header_token.or(query_token),
        requested_room: path_room.or(query_room),
        query,
    }
}

async fn upgrade(
    ws: WebSocketUpgrade,
    state: AppState,
    ctx: ConnectContext,
) -> Result<Response, AppError> {
    let admission = state.gateway.admit(&ctx).await?;
    let gateway = Arc::clone(&state.gateway);
    let limits = &state.settings.websocket;

    Ok(ws
        .max_message_size(limits.max_message_size)
        .max_frame_size(limits.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, gateway, admission)))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, gateway: Arc<Gateway>, admission: Admission) {
    let (connection, queue) = match gateway.open(admission) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to open connection");
            return;
        }
    };

    // Split socket for concurrent read/write
    let (sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(
        Arc::clone(&connection).run_writer(queue, sink.with(encode_outbound)),
    );

    let mut session = SessionState::new(connection.id());
    let reason = read_frames(
        &mut stream,
        &connection,
        gateway.hub(),
        gateway.max_protocol_errors(),
        &mut session,
    )
    .await;

    connection.close(reason);

    match timeout(WRITER_GRACE, &mut writer).await {
        Ok(Ok(Err(e))) => {
            tracing::debug!(connection_id = %connection.id(), error = %e, "Writer stopped");
        }
        Ok(Err(e)) => {
            tracing::warn!(connection_id = %connection.id(), error = %e, "Writer task failed");
        }
        Ok(Ok(Ok(()))) => {}
        Err(_) => {
            tracing::debug!(connection_id = %connection.id(), "Writer did not finish in time");
            writer.abort();
        }
    }

    gateway.release(&connection);

    tracing::debug!(
        connection_id = %connection.id(),
        frames = session.frames_received,
        protocol_errors = session.protocol_errors,
        duration_ms = session.connected_for().as_millis() as u64,
        idle_ms = session.idle_for().as_millis() as u64,
        "Connection finished"
    );
}

/// Reader path: route every valid frame until the client goes away or the
/// connection is closed from elsewhere. Returns why reading stopped.
pub(crate) async fn read_frames<S>(
    stream: &mut S,
    connection: &Connection,
    hub: &BroadcastHub,
    max_protocol_errors: u32,
    session: &mut SessionState,
) -> CloseReason
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        tokio::select! {
            reason = connection.closed() => return reason,

            frame = stream.next() => {
                let flow = match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(text.as_str(), connection, hub, max_protocol_errors, session)
                    }
                    Some(Ok(Message::Binary(_))) => protocol_error(
                        RelayError::Protocol("binary frames are not supported".into()),
                        connection,
                        max_protocol_errors,
                        session,
                    ),
                    Some(Ok(Message::Close(_))) | None => {
                        ControlFlow::Break(CloseReason::ClientClosed)
                    }
                    // Ping/pong are answered by the transport
                    Some(Ok(_)) => ControlFlow::Continue(()),
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection.id(), error = %e, "WebSocket error");
                        ControlFlow::Break(CloseReason::TransportError)
                    }
                };

                if let ControlFlow::Break(reason) = flow {
                    return reason;
                }
            }
        }
    }
}

fn handle_text(
    text: &str,
    connection: &Connection,
    hub: &BroadcastHub,
    max_protocol_errors: u32,
    session: &mut SessionState,
) -> ControlFlow<CloseReason> {
    session.record_frame();

    match InboundFrame::decode(text) {
        Ok(frame) => {
            hub.route(connection.room(), connection.id(), frame.message);
            ControlFlow::Continue(())
        }
        Err(e) => protocol_error(e, connection, max_protocol_errors, session),
    }
}

fn protocol_error(
    error: RelayError,
    connection: &Connection,
    max_protocol_errors: u32,
    session: &mut SessionState,
) -> ControlFlow<CloseReason> {
    metrics::record_protocol_error();
    let count = session.record_protocol_error();

    tracing::warn!(
        connection_id = %connection.id(),
        error = %error,
        count,
        "Dropped malformed frame"
    );

    if session.exceeded(max_protocol_errors) {
        ControlFlow::Break(CloseReason::ProtocolViolation)
    } else {
        ControlFlow::Continue(())
    }
}
