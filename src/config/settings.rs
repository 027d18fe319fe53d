//! Application settings and configuration structures.

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::{DeliveryPolicy, EchoPolicy, OverflowPolicy, RoomName, DEFAULT_ROOM};

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Relay behavior (rooms, queues, policies)
    pub relay: RelaySettings,

    /// WebSocket transport limits
    pub websocket: WebSocketSettings,

    /// Identity resolution settings
    pub auth: AuthSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on (0 picks an ephemeral port)
    pub port: u16,
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    /// Room joined when the client does not name one
    pub default_room: String,

    /// Let clients pick their room via `/ws/{room}` or `?room=`
    pub allow_room_selection: bool,

    /// Bound of each connection's outbound queue
    pub queue_capacity: usize,

    /// Whether senders receive their own broadcasts
    pub echo_policy: EchoPolicy,

    /// Reaction to a saturated recipient queue
    pub overflow_policy: OverflowPolicy,

    /// Malformed frames tolerated before closing the connection (0 = never close)
    pub max_protocol_errors: u32,

    /// Cap on simultaneous connections (0 = unlimited)
    pub max_connections: usize,

    /// Drop rooms from the registry once their last member leaves
    pub evict_empty_rooms: bool,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum message size in bytes (default: 64KB)
    pub max_message_size: usize,

    /// Maximum frame size in bytes (default: 16KB)
    pub max_frame_size: usize,
}

/// Identity resolution configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HS256 secret for bearer tokens; unset means every caller is anonymous
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Reject connections that present no credentials
    pub require_identity: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins
    pub allowed_origins: Vec<String>,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::default_builder(&environment)?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__RELAY__QUEUE_CAPACITY=512 -> relay.queue_capacity = 512
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validated)
    }

    /// Built-in defaults only, without files or environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::default_builder("test")?
            .build()?
            .try_deserialize()
            .and_then(Self::validated)
    }

    fn default_builder(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("relay.default_room", DEFAULT_ROOM)?
            .set_default("relay.allow_room_selection", true)?
            .set_default("relay.queue_capacity", 256_i64)?
            .set_default("relay.echo_policy", "include_sender")?
            .set_default("relay.overflow_policy", "disconnect")?
            .set_default("relay.max_protocol_errors", 5_i64)?
            .set_default("relay.max_connections", 0_i64)?
            .set_default("relay.evict_empty_rooms", true)?
            // WebSocket settings - security limits to prevent DoS
            .set_default("websocket.max_message_size", 65536_i64)? // 64KB
            .set_default("websocket.max_frame_size", 16384_i64)? // 16KB
            .set_default("auth.require_identity", false)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])
    }

    /// Reject settings the relay cannot run with.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.relay.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "relay.queue_capacity must be greater than zero".into(),
            ));
        }

        if let Err(e) = RoomName::parse(self.relay.default_room.as_str()) {
            return Err(ConfigError::Message(format!(
                "relay.default_room is invalid: {}",
                e
            )));
        }

        match &self.auth.jwt_secret {
            Some(secret) if secret.len() < MIN_JWT_SECRET_LENGTH => {
                return Err(ConfigError::Message(format!(
                    "JWT secret must be at least {} characters for security. Current length: {}",
                    MIN_JWT_SECRET_LENGTH,
                    secret.len()
                )));
            }
            None if self.auth.require_identity => {
                return Err(ConfigError::Message(
                    "auth.require_identity needs auth.jwt_secret".into(),
                ));
            }
            _ => {}
        }

        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl RelaySettings {
    /// The validated default room.
    pub fn default_room(&self) -> RoomName {
        RoomName::parse(self.default_room.as_str()).unwrap_or_default()
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy::new(self.echo_policy, self.overflow_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let settings = Settings::defaults().unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.relay.default_room, "community_chatroom");
        assert_eq!(settings.relay.queue_capacity, 256);
        assert_eq!(settings.relay.delivery_policy(), DeliveryPolicy::default());
        assert_eq!(settings.relay.max_protocol_errors, 5);
        assert!(settings.relay.allow_room_selection);
        assert!(settings.relay.evict_empty_rooms);
        assert_eq!(settings.auth.jwt_secret, None);
        assert_eq!(settings.server_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let mut settings = Settings::defaults().unwrap();
        settings.relay.queue_capacity = 0;
        assert!(settings.validated().is_err());
    }

    #[test]
    fn test_invalid_default_room_rejected() {
        let mut settings = Settings::defaults().unwrap();
        settings.relay.default_room = "no spaces allowed".into();
        assert!(settings.validated().is_err());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut settings = Settings::defaults().unwrap();
        settings.auth.jwt_secret = Some("short".into());
        assert!(settings.validated().is_err());

        let mut settings = Settings::defaults().unwrap();
        settings.auth.jwt_secret = Some("x".repeat(MIN_JWT_SECRET_LENGTH));
        assert!(settings.validated().is_ok());
    }

    #[test]
    fn test_required_identity_needs_secret() {
        let mut settings = Settings::defaults().unwrap();
        settings.auth.require_identity = true;
        assert!(settings.validated().is_err());
    }
}
