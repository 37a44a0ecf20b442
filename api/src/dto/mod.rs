pub mod error;
pub mod mfa;

pub use error::{internal_error, unauthenticated, ErrorResponse, ErrorResponseExt};
pub use mfa::*;
