//! MySQL implementations of the core store interfaces

pub mod identity_store_impl;

pub use identity_store_impl::MySqlIdentityStore;
