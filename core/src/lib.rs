//! # Mail2FA Core
//!
//! Verification state machine for email-based two-factor authentication.
//! This crate contains the domain entities, the code manager, the throttle
//! gate, the request-facing access guard, and the store and dispatcher
//! interfaces that infrastructure crates implement.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
