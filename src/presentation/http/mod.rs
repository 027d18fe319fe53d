//! HTTP Surface
//!
//! Routes, probes and the metrics endpoint.

pub mod handlers;
pub mod routes;

pub use routes::create_router;
