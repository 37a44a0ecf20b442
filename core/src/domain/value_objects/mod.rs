//! Value objects representing immutable domain concepts.

pub mod code_notice;
pub mod outcomes;

// Re-export commonly used types
pub use code_notice::CodeNotice;
pub use outcomes::{AccessDecision, Challenge, ResendOutcome, SubmitOutcome, VerifyOutcome};
