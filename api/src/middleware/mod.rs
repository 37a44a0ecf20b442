pub mod auth;
pub mod mfa_guard;
pub mod session;

pub use auth::*;
pub use mfa_guard::*;
pub use session::*;
