//! # Relay Server
//!
//! Entry point: initializes logging, loads configuration and serves the
//! relay until Ctrl-C.

use anyhow::Result;
use tracing::info;

use relay_server::config::Settings;
use relay_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    relay_server::telemetry::init_tracing();

    info!("Starting Relay Server...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        default_room = %settings.relay.default_room,
        echo = ?settings.relay.echo_policy,
        overflow = ?settings.relay.overflow_policy,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
