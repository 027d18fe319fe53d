//! # Domain Entities
//!
//! - **Envelope**: an inbound message stamped with room, sender and ingress
//!   time, shared by every recipient of one broadcast

mod envelope;

pub use envelope::Envelope;
