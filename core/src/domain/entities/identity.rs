//! Authenticated principal handed to the guard by the transport.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An already-authenticated user
///
/// Login is owned by an upstream system; the guard only needs a stable id to
/// key the verification record and an address to deliver codes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier
    pub user_id: Uuid,

    /// Delivery address for verification codes
    pub email: String,

    /// Display name used in the email greeting
    #[serde(default)]
    pub name: Option<String>,
}

impl Identity {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
