//! # Domain Layer
//!
//! The vocabulary of the relay, independent of transport and runtime.
//!
//! ## Structure
//!
//! - **entities**: the message envelope
//! - **value_objects**: connection handles, room names, identities
//! - **services**: collaborator contracts (identity and room resolution)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Collaborator traits are implemented in the infrastructure layer

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use value_objects::*;
