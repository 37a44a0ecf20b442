//! actix-web transport for the email verification guard
//!
//! Exposed as a library so integration tests and embedding applications
//! can build the app with their own stores.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;

pub use app::create_app;
pub use routes::mfa::AppState;
