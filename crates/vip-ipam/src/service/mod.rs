//! # Reconciliation Service
//!
//! Orchestrates one allocation attempt per reconciliation event: gathers
//! claims and configuration through the outbound ports, runs pool resolution
//! and allocation, and persists the result with optimistic-concurrency retry.

// Semantic submodules
mod api;
mod core;
mod retry;

pub use self::core::{ReconcileState, ReconciliationCoordinator, SyncOutcome};
pub use retry::RetryPolicy;
