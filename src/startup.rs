//! Application Startup
//!
//! Application building and server initialization.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::{BroadcastHub, RoomRegistry};
use crate::config::Settings;
use crate::domain::{IdentityResolver, RoomNameSource};
use crate::infrastructure::identity::{
    AnonymousIdentityResolver, FixedRoomSource, JwtIdentityResolver, RequestedRoomSource,
};
use crate::presentation::http::{handlers::health, routes};
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::Gateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the registry, hub and gateway from validated settings.
    pub fn new(settings: Settings) -> Self {
        let relay = &settings.relay;

        let registry = Arc::new(RoomRegistry::new(relay.evict_empty_rooms));
        let hub = Arc::new(BroadcastHub::new(registry, relay.delivery_policy()));

        let identity_resolver: Arc<dyn IdentityResolver> = match &settings.auth.jwt_secret {
            Some(secret) => Arc::new(JwtIdentityResolver::new(
                secret,
                settings.auth.require_identity,
            )),
            None => Arc::new(AnonymousIdentityResolver),
        };

        let room_source: Arc<dyn RoomNameSource> = if relay.allow_room_selection {
            Arc::new(RequestedRoomSource::new(relay.default_room()))
        } else {
            Arc::new(FixedRoomSource::new(relay.default_room()))
        };

        let gateway = Arc::new(Gateway::new(relay, hub, identity_resolver, room_source));

        Self {
            gateway,
            settings: Arc::new(settings),
        }
    }
}

/// Router with the HTTP middleware stack applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);

    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let addr = settings.server_addr();
        let state = AppState::new(settings);
        let router = build_router(state.clone());

        // Bind to address
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// Run the server until Ctrl-C
    pub async fn run_until_stopped(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves, then close every connection.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let gateway = Arc::clone(&self.state.gateway);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                gateway.shutdown();
            })
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
