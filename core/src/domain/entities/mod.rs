//! Domain entities representing the verification state.

pub mod identity;
pub mod throttle_state;
pub mod verification_record;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use identity::Identity;
pub use throttle_state::{SessionContext, ThrottleState};
pub use verification_record::VerificationRecord;
