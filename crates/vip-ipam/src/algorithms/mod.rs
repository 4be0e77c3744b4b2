//! # Algorithms
//!
//! Pure pool resolution and address selection.

pub mod allocator;
pub mod resolver;

pub use allocator::{allocate, allocate_address, Allocation};
pub use resolver::resolve_pool;
