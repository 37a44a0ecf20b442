//! Utility functions shared across crates

pub mod masking;
pub mod validation;

pub use masking::mask_email;
pub use validation::is_valid_email;
