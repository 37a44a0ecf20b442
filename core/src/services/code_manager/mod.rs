//! Code manager module for one-time email codes
//!
//! This module owns the lifecycle of a verification code:
//! - Uniform CSPRNG generation of fixed-width numeric codes
//! - Salted bcrypt hashing before anything is stored
//! - Expiry checks with an inclusive boundary
//! - One-time consumption through compare-and-swap on the identity store

mod service;


pub use service::{CodeManager, IssuedCode};
