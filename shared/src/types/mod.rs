//! Type definitions shared by the transport layer
//!
//! - `response` - API response wrappers and the verification page payload

pub mod response;

pub use response::{ApiResponse, HealthResponse, VerificationPagePayload};
