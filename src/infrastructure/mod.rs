//! # Infrastructure Layer
//!
//! Implementations of the collaborator contracts and process-wide metrics.
//!
//! - **identity**: identity resolvers and room-name sources
//! - **metrics**: Prometheus registry and helpers

pub mod identity;
pub mod metrics;
