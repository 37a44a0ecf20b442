pub mod identity;
pub mod session;

pub use identity::{IdentityStore, InMemoryIdentityStore};
pub use session::{InMemorySessionStore, SessionStore};
