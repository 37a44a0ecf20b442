pub mod error;

pub use error::{handle_domain_error, invalid_code_response, rejection_response};
