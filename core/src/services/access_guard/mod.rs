//! Request-facing verification state machine
//!
//! Per (user, session) the guard moves between unchallenged, challenged and
//! verified, composing the code manager (per-user record) with the throttle
//! gate (per-session state). Transports call exactly these operations:
//! `evaluate_access`, `submit_code`, `request_resend` and `reset`.

mod service;


pub use service::AccessGuard;
