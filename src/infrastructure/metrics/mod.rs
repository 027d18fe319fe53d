//! Prometheus Metrics Module
//!
//! Provides relay-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Active WebSocket connections and rooms
//! - Messages routed and per-recipient delivery outcomes
//! - Protocol errors and connection close reasons

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Active WebSocket connections gauge
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("relay_server"),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Rooms currently present in the registry
pub static ROOMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("rooms_active", "Number of rooms with a registry entry").namespace("relay_server"),
    )
    .expect("Failed to create ROOMS_ACTIVE metric")
});

/// Inbound messages handed to the hub
pub static MESSAGES_ROUTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("messages_routed_total", "Total number of messages routed")
            .namespace("relay_server"),
    )
    .expect("Failed to create MESSAGES_ROUTED_TOTAL metric")
});

/// Per-recipient delivery outcomes
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("deliveries_total", "Per-recipient delivery attempts by outcome")
            .namespace("relay_server"),
        &["outcome"], // "delivered", "dropped", "disconnected", "stale", "skipped"
    )
    .expect("Failed to create DELIVERIES_TOTAL metric")
});

/// Malformed inbound frames
pub static PROTOCOL_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("protocol_errors_total", "Total number of malformed inbound frames")
            .namespace("relay_server"),
    )
    .expect("Failed to create PROTOCOL_ERRORS_TOTAL metric")
});

/// Connection closes by reason
pub static CONNECTIONS_CLOSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("connections_closed_total", "Total number of closed connections by reason")
            .namespace("relay_server"),
        &["reason"],
    )
    .expect("Failed to create CONNECTIONS_CLOSED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(ROOMS_ACTIVE.clone()))
        .expect("Failed to register ROOMS_ACTIVE");
    registry
        .register(Box::new(MESSAGES_ROUTED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_ROUTED_TOTAL");
    registry
        .register(Box::new(DELIVERIES_TOTAL.clone()))
        .expect("Failed to register DELIVERIES_TOTAL");
    registry
        .register(Box::new(PROTOCOL_ERRORS_TOTAL.clone()))
        .expect("Failed to register PROTOCOL_ERRORS_TOTAL");
    registry
        .register(Box::new(CONNECTIONS_CLOSED_TOTAL.clone()))
        .expect("Failed to register CONNECTIONS_CLOSED_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to update the connection gauge
pub fn set_websocket_connections(active: usize) {
    WEBSOCKET_CONNECTIONS_ACTIVE.set(active as i64);
}

/// Helper to update the room gauge
pub fn set_rooms_active(rooms: usize) {
    ROOMS_ACTIVE.set(rooms as i64);
}

/// Helper to record one routed message and its per-recipient outcomes
pub fn record_route(delivered: u64, dropped: u64, disconnected: u64, stale: u64, skipped: u64) {
    MESSAGES_ROUTED_TOTAL.inc();
    for (outcome, count) in [
        ("delivered", delivered),
        ("dropped", dropped),
        ("disconnected", disconnected),
        ("stale", stale),
        ("skipped", skipped),
    ] {
        if count > 0 {
            DELIVERIES_TOTAL.with_label_values(&[outcome]).inc_by(count);
        }
    }
}

/// Helper to record a malformed inbound frame
pub fn record_protocol_error() {
    PROTOCOL_ERRORS_TOTAL.inc();
}

/// Helper to record a connection close
pub fn record_connection_closed(reason: &str) {
    CONNECTIONS_CLOSED_TOTAL.with_label_values(&[reason]).inc();
}
