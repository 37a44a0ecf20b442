pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;
pub mod memory;

#[cfg(test)]
mod tests;

pub use memory::InMemorySessionStore;
pub use r#trait::SessionStore;
