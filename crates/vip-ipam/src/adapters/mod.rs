//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound store ports.

mod config_store;
mod request_store;

pub use config_store::InMemoryConfigStore;
pub use request_store::{matches_selector, InMemoryRequestStore};
