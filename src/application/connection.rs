//! Connection
//!
//! One client's live duplex stream as seen by the relay: a bounded outbound
//! queue, a liveness state machine and the writer path that drains the queue
//! into the transport. The reader path lives with the transport in the
//! presentation layer and talks to the connection only through [`Connection::close`]
//! and [`Connection::closed`].
//!
//! State machine: `Idle → Joined → Closing → Closed`. `Closing` is entered by
//! the first [`Connection::close`] call; from that point every
//! [`Connection::send`] fails with [`RelayError::Closed`]. `Closed` is set by
//! the writer once it has released the transport.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures::{Sink, SinkExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::application::services::RoomRegistry;
use crate::domain::{ConnectionId, Envelope, Identity, RoomName};
use crate::shared::error::RelayError;

/// Receiving half of a connection's outbound queue, owned by its writer.
pub type OutboundQueue = mpsc::Receiver<Arc<Envelope>>;

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    /// Created, not yet a member of any room
    Idle = 0,
    /// Member of at least one room
    Joined = 1,
    /// Close requested; sends fail, writer is shutting down
    Closing = 2,
    /// Writer finished, transport released
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Joined,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Why a connection was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Client closed the socket or went away
    ClientClosed,
    /// Too many malformed frames
    ProtocolViolation,
    /// Outbound queue stayed saturated
    SlowConsumer,
    /// Read or write failure on the socket
    TransportError,
    /// Server is stopping
    ServerShutdown,
}

impl CloseReason {
    /// WebSocket close code sent to the client.
    pub fn code(&self) -> u16 {
        match self {
            Self::ClientClosed => 1000,
            Self::ServerShutdown => 1001,
            Self::ProtocolViolation => 1008,
            Self::TransportError => 1011,
            Self::SlowConsumer => 1013,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::ProtocolViolation => "protocol_violation",
            Self::SlowConsumer => "slow_consumer",
            Self::TransportError => "transport_error",
            Self::ServerShutdown => "server_shutdown",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Items the writer pushes into the transport sink.
#[derive(Debug, Clone)]
pub enum Outbound {
    Deliver(Arc<Envelope>),
    Close(CloseReason),
}

/// A live connection, shared by the registry (membership) and its writer.
pub struct Connection {
    id: ConnectionId,
    identity: Identity,
    room: RoomName,
    outbound: mpsc::Sender<Arc<Envelope>>,
    state: AtomicU8,
    close_signal: watch::Sender<Option<CloseReason>>,
    /// Rooms this connection is a member of. The lock also serializes the
    /// transition to `Closing` against joins.
    rooms: Mutex<HashSet<RoomName>>,
    registry: Arc<RoomRegistry>,
}

impl Connection {
    /// Create a connection with an outbound queue bounded at `capacity`.
    ///
    /// `capacity` must be non-zero; settings validation guarantees it.
    pub fn new(
        id: ConnectionId,
        identity: Identity,
        room: RoomName,
        capacity: usize,
        registry: Arc<RoomRegistry>,
    ) -> (Arc<Self>, OutboundQueue) {
        let (outbound, queue) = mpsc::channel(capacity.max(1));
        let (close_signal, _) = watch::channel(None);

        let connection = Arc::new(Self {
            id,
            identity,
            room,
            outbound,
            state: AtomicU8::new(ConnectionState::Idle as u8),
            close_signal,
            rooms: Mutex::new(HashSet::new()),
            registry,
        });

        (connection, queue)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The room this connection was admitted into; its messages are routed here.
    pub fn room(&self) -> &RoomName {
        &self.room
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once close has begun.
    pub fn is_closed(&self) -> bool {
        self.state() >= ConnectionState::Closing
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        *self.close_signal.borrow()
    }

    /// Snapshot of the rooms this connection belongs to.
    pub fn rooms(&self) -> Vec<RoomName> {
        self.rooms.lock().iter().cloned().collect()
    }

    /// Number of envelopes waiting for the writer.
    pub fn queued(&self) -> usize {
        self.outbound.max_capacity() - self.outbound.capacity()
    }

    /// Enqueue an envelope without waiting.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Closed`] once close has begun
    /// - [`RelayError::QueueFull`] when the bounded queue is saturated
    pub fn send(&self, envelope: Arc<Envelope>) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::Closed);
        }

        self.outbound.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RelayError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => RelayError::Closed,
        })
    }

    /// Close the connection and leave every room it belongs to.
    ///
    /// Idempotent: only the first call has an effect and returns `true`.
    pub fn close(&self, reason: CloseReason) -> bool {
        let rooms = {
            let mut rooms = self.rooms.lock();
            if self.is_closed() {
                return false;
            }
            self.state
                .store(ConnectionState::Closing as u8, Ordering::Release);
            std::mem::take(&mut *rooms)
        };

        self.close_signal.send_replace(Some(reason));

        for room in &rooms {
            self.registry.leave(room, self.id);
        }

        tracing::debug!(
            connection_id = %self.id,
            reason = %reason,
            rooms = rooms.len(),
            queued = self.queued(),
            "Connection closing"
        );

        true
    }

    /// Resolves once close has begun, yielding the reason.
    pub async fn closed(&self) -> CloseReason {
        wait_for_close(self.close_signal.subscribe()).await
    }

    /// Record membership of `room`. Refused once close has begun so a late
    /// join cannot leave a dead member behind.
    pub(crate) fn track_room(&self, room: &RoomName) -> Result<(), RelayError> {
        let mut rooms = self.rooms.lock();
        if self.is_closed() {
            return Err(RelayError::Closed);
        }
        rooms.insert(room.clone());
        let _ = self.state.compare_exchange(
            ConnectionState::Idle as u8,
            ConnectionState::Joined as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Ok(())
    }

    pub(crate) fn untrack_room(&self, room: &RoomName) {
        let mut rooms = self.rooms.lock();
        if rooms.remove(room) && rooms.is_empty() {
            let _ = self.state.compare_exchange(
                ConnectionState::Joined as u8,
                ConnectionState::Idle as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }

    /// Writer path: drain the queue into `sink` in FIFO order until the
    /// connection closes.
    ///
    /// Envelopes still queued at close time are dropped. On a clean stop a
    /// best-effort [`Outbound::Close`] is sent before the sink is closed. A
    /// sink failure closes the connection with [`CloseReason::TransportError`].
    pub async fn run_writer<S>(
        self: Arc<Self>,
        mut queue: OutboundQueue,
        mut sink: S,
    ) -> Result<(), RelayError>
    where
        S: Sink<Outbound> + Unpin,
        S::Error: fmt::Display,
    {
        let closing = wait_for_close(self.close_signal.subscribe());
        tokio::pin!(closing);

        let result = loop {
            tokio::select! {
                biased;

                _ = &mut closing => break Ok(()),

                next = queue.recv() => match next {
                    Some(envelope) => {
                        if let Err(e) = sink.send(Outbound::Deliver(envelope)).await {
                            tracing::debug!(
                                connection_id = %self.id,
                                error = %e,
                                "Write failed"
                            );
                            self.close(CloseReason::TransportError);
                            break Err(RelayError::Transport(e.to_string()));
                        }
                    }
                    None => break Ok(()),
                },
            }
        };

        if result.is_ok() {
            let reason = self.close_reason().unwrap_or(CloseReason::ServerShutdown);
            let _ = sink.send(Outbound::Close(reason)).await;
        }
        let _ = sink.close().await;

        self.state.store(ConnectionState::Closed as u8, Ordering::Release);
        result
    }
}

async fn wait_for_close(mut signal: watch::Receiver<Option<CloseReason>>) -> CloseReason {
    signal
        .wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|reason| *reason)
        .unwrap_or(CloseReason::ServerShutdown)
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("room", &self.room)
            .field("state", &self.state())
            .finish()
    }
}
