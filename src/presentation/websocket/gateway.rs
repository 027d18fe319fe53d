//! WebSocket Gateway
//!
//! Admits connections, joins them to their room and keeps track of every
//! live connection so the server can close them all on shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::application::{BroadcastHub, CloseReason, Connection, OutboundQueue, RoomRegistry};
use crate::config::RelaySettings;
use crate::domain::{
    ConnectContext, ConnectionId, Identity, IdentityResolver, RoomName, RoomNameSource,
};
use crate::infrastructure::metrics;
use crate::shared::error::{AppError, RelayError};

/// Outcome of a successful handshake check, consumed by [`Gateway::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub identity: Identity,
    pub room: RoomName,
}

/// WebSocket gateway managing all connections
pub struct Gateway {
    /// Live connections by id
    connections: DashMap<ConnectionId, Arc<Connection>>,
    registry: Arc<RoomRegistry>,
    hub: Arc<BroadcastHub>,
    identity_resolver: Arc<dyn IdentityResolver>,
    room_source: Arc<dyn RoomNameSource>,
    queue_capacity: usize,
    max_connections: usize,
    max_protocol_errors: u32,
    accepting: AtomicBool,
}

impl Gateway {
    pub fn new(
        settings: &RelaySettings,
        hub: Arc<BroadcastHub>,
        identity_resolver: Arc<dyn IdentityResolver>,
        room_source: Arc<dyn RoomNameSource>,
    ) -> Self {
        Self {
            connections: DashMap::new(),
            registry: Arc::clone(hub.registry()),
            hub,
            identity_resolver,
            room_source,
            queue_capacity: settings.queue_capacity,
            max_connections: settings.max_connections,
            max_protocol_errors: settings.max_protocol_errors,
            accepting: AtomicBool::new(true),
        }
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn max_protocol_errors(&self) -> u32 {
        self.max_protocol_errors
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Decide whether a handshake may proceed. Nothing is registered yet, so
    /// a rejected client leaves no trace in the registry.
    ///
    /// # Errors
    ///
    /// - [`AppError::Unavailable`] while shutting down or at capacity
    /// - [`AppError::Unauthorized`] when identity resolution fails
    /// - [`AppError::BadRequest`] when the room name is invalid
    pub async fn admit(&self, ctx: &ConnectContext) -> Result<Admission, AppError> {
        if !self.is_accepting() {
            return Err(AppError::Unavailable("Server is shutting down".into()));
        }

        // Soft cap: concurrent handshakes may overshoot by a few.
        if self.max_connections > 0 && self.connection_count() >= self.max_connections {
            return Err(AppError::Unavailable("Too many connections".into()));
        }

        let identity = self.identity_resolver.resolve(ctx).await.map_err(|e| {
            tracing::debug!(error = %e, "Handshake rejected: identity");
            AppError::from(e)
        })?;

        let room = self.room_source.resolve(ctx).map_err(|e| {
            tracing::debug!(error = %e, "Handshake rejected: room");
            AppError::from(e)
        })?;

        Ok(Admission { identity, room })
    }

    /// Create the connection for an admitted client and join it to its room.
    ///
    /// The returned queue belongs to the connection's writer.
    pub fn open(
        &self,
        admission: Admission,
    ) -> Result<(Arc<Connection>, OutboundQueue), RelayError> {
        if !self.is_accepting() {
            return Err(RelayError::Closed);
        }

        let Admission { identity, room } = admission;
        let (connection, queue) = Connection::new(
            ConnectionId::generate(),
            identity,
            room.clone(),
            self.queue_capacity,
            Arc::clone(&self.registry),
        );

        self.connections
            .insert(connection.id(), Arc::clone(&connection));

        if let Err(e) = self.registry.join(&room, &connection) {
            self.connections.remove(&connection.id());
            return Err(e);
        }

        // A shutdown that ran between the check above and the insert missed us.
        if !self.is_accepting() {
            connection.close(CloseReason::ServerShutdown);
        }

        metrics::set_websocket_connections(self.connections.len());

        tracing::info!(
            connection_id = %connection.id(),
            identity = %connection.identity(),
            room = %room,
            "Connection opened"
        );

        Ok((connection, queue))
    }

    /// Forget a finished connection. Closes it first if nothing else did.
    pub fn release(&self, connection: &Connection) {
        connection.close(CloseReason::ClientClosed);

        if self.connections.remove(&connection.id()).is_some() {
            let reason = connection
                .close_reason()
                .unwrap_or(CloseReason::ClientClosed);
            metrics::record_connection_closed(reason.as_str());
            metrics::set_websocket_connections(self.connections.len());

            tracing::info!(
                connection_id = %connection.id(),
                reason = %reason,
                "Connection released"
            );
        }
    }

    /// Stop admitting connections and close every live one.
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);

        let live: Vec<Arc<Connection>> = self
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for connection in &live {
            connection.close(CloseReason::ServerShutdown);
        }

        tracing::info!(connections = live.len(), "Gateway shut down");
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
