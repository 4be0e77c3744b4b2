//! Metrics hooks for reconciliation
//!
//! Counters for binding outcomes, conflict retries and failures by kind.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use vip_ipam::metrics::Metrics;
//!
//! let metrics = Arc::new(Metrics::new());
//! let coordinator = ReconciliationCoordinator::new(requests, config, ipam_config)
//!     .with_metrics(metrics.clone());
//! // ...
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::IpamError;

/// Thread-safe reconciliation counters
#[derive(Default)]
pub struct Metrics {
    /// Reconciliations started (create and update events)
    pub reconciliations: AtomicU64,
    /// Requests that were already bound and skipped
    pub already_bound: AtomicU64,
    /// Addresses successfully persisted
    pub addresses_bound: AtomicU64,
    /// Writes retried after a version conflict
    pub conflict_retries: AtomicU64,
    /// Deletion events seen
    pub deletions: AtomicU64,
    pub failures_pool_not_found: AtomicU64,
    pub failures_invalid_pool: AtomicU64,
    pub failures_exhausted: AtomicU64,
    /// Store, persistence-budget and cancellation failures
    pub failures_persistence: AtomicU64,
    /// Cumulative time from start of reconciliation to committed write
    pub bind_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            already_bound: self.already_bound.load(Ordering::Relaxed),
            addresses_bound: self.addresses_bound.load(Ordering::Relaxed),
            conflict_retries: self.conflict_retries.load(Ordering::Relaxed),
            deletions: self.deletions.load(Ordering::Relaxed),
            failures_pool_not_found: self.failures_pool_not_found.load(Ordering::Relaxed),
            failures_invalid_pool: self.failures_invalid_pool.load(Ordering::Relaxed),
            failures_exhausted: self.failures_exhausted.load(Ordering::Relaxed),
            failures_persistence: self.failures_persistence.load(Ordering::Relaxed),
            avg_bind_ns: self.avg_bind_time_ns(),
        }
    }

    /// Average time to bind an address, in nanoseconds
    pub fn avg_bind_time_ns(&self) -> u64 {
        let total = self.bind_time_ns.load(Ordering::Relaxed);
        let count = self.addresses_bound.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    pub fn total_failures(&self) -> u64 {
        self.failures_pool_not_found.load(Ordering::Relaxed)
            + self.failures_invalid_pool.load(Ordering::Relaxed)
            + self.failures_exhausted.load(Ordering::Relaxed)
            + self.failures_persistence.load(Ordering::Relaxed)
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub reconciliations: u64,
    pub already_bound: u64,
    pub addresses_bound: u64,
    pub conflict_retries: u64,
    pub deletions: u64,
    pub failures_pool_not_found: u64,
    pub failures_invalid_pool: u64,
    pub failures_exhausted: u64,
    pub failures_persistence: u64,
    pub avg_bind_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this to forward counters to Prometheus, StatsD or similar.
pub trait MetricsRecorder: Send + Sync {
    fn record_reconcile_started(&self);
    fn record_already_bound(&self);
    fn record_bound(&self, elapsed: Duration);
    fn record_conflict_retry(&self);
    fn record_failure(&self, error: &IpamError);
    fn record_deletion(&self);
}

/// No-op recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_reconcile_started(&self) {}
    fn record_already_bound(&self) {}
    fn record_bound(&self, _: Duration) {}
    fn record_conflict_retry(&self) {}
    fn record_failure(&self, _: &IpamError) {}
    fn record_deletion(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_reconcile_started(&self) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_already_bound(&self) {
        self.already_bound.fetch_add(1, Ordering::Relaxed);
    }

    fn record_bound(&self, elapsed: Duration) {
        self.addresses_bound.fetch_add(1, Ordering::Relaxed);
        self.bind_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    fn record_conflict_retry(&self) {
        self.conflict_retries.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, error: &IpamError) {
        let counter = match error {
            IpamError::PoolNotFound { .. } => &self.failures_pool_not_found,
            IpamError::InvalidPool { .. } => &self.failures_invalid_pool,
            IpamError::Exhausted { .. } => &self.failures_exhausted,
            IpamError::PersistenceFailed { .. }
            | IpamError::Cancelled { .. }
            | IpamError::Store(_) => &self.failures_persistence,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_deletion(&self) {
        self.deletions.fetch_add(1, Ordering::Relaxed);
    }
}
