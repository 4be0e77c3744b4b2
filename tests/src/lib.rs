//! # VIP IPAM Test Suite
//!
//! Cross-component tests for the `vip-ipam` crate, driven through its public
//! API and in-memory stores.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── allocation_flows.rs   # bootstrap, fill, release, pool edits
//! │   └── concurrency.rs        # many workers, optimistic writes
//! └── benches/
//!     └── allocation_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vip-ipam-tests
//! cargo test -p vip-ipam-tests integration::concurrency
//!
//! # Benchmarks
//! cargo bench -p vip-ipam-tests
//! ```

#![allow(dead_code)]

pub mod integration;
