//! # Relay Server Library
//!
//! A room-based real-time message relay over WebSockets:
//! - clients connect to a room and send `{"message": "..."}` frames
//! - every frame is fanned out to all current members of the room
//! - membership lives only in memory and disappears with the connection
//!
//! ## Architecture
//!
//! - **Domain Layer**: room names, identities, envelopes and connect-time traits
//! - **Application Layer**: connections, the room registry and the broadcast hub
//! - **Infrastructure Layer**: identity resolvers and Prometheus metrics
//! - **Presentation Layer**: HTTP probes and the WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! relay_server/
//! +-- config/         Configuration management
//! +-- domain/         Value objects, envelope, resolver traits
//! +-- application/    Connection, RoomRegistry, BroadcastHub
//! +-- infrastructure/ JWT identity, room sources, metrics
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Error types
//! ```

// Configuration module
pub mod config;

// Domain layer
pub mod domain;

// Application layer - relay core
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
