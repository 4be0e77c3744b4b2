//! # VIP IPAM
//!
//! Assigns a unique virtual IP to each load-balancer service request from
//! administrator-defined address pools.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): pools, claim sets, service requests
//! - **Algorithms** (`algorithms/`): pure pool resolution and address selection
//!   - `resolve_pool`: `cidr-<ns>` → `cidr-global` → `range-<ns>` → `range-global`
//!   - `allocate`: lowest unclaimed usable address of a CIDR block or range
//! - **Ports Layer** (`ports/`): trait definitions
//!   - `LoadBalancerApi`: driving port used by the host runtime
//!   - `RequestStore`, `ConfigStore`: driven ports
//! - **Service Layer** (`service/`): `ReconciliationCoordinator`
//! - **Adapters Layer** (`adapters/`): in-memory stores
//!
//! ## Invariants
//!
//! - A request with an assigned address is never re-assigned, and
//!   reconciling it again performs no write.
//! - The allocator never returns an address in the claim set, and for equal
//!   inputs always returns the same (lowest) address.
//! - A request's bound fields change only through one committed `update`.
//!
//! ## Concurrency
//!
//! Writes to a single request are protected by optimistic concurrency.
//! Two *different* requests reconciled at the same moment may still compute
//! the same first free address, since nothing serializes allocation per pool.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vip_ipam::{
//!     InMemoryConfigStore, InMemoryRequestStore, IpamConfig, LoadBalancerApi,
//!     ReconciliationCoordinator,
//! };
//!
//! let config = IpamConfig::load()?;
//! let requests = Arc::new(InMemoryRequestStore::new());
//! let documents = Arc::new(InMemoryConfigStore::new());
//! let coordinator = ReconciliationCoordinator::new(requests, documents, config);
//!
//! let status = coordinator.ensure_load_balancer("cluster", &request).await?;
//! ```

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod telemetry;

// Re-exports for convenience
pub use adapters::{InMemoryConfigStore, InMemoryRequestStore};
pub use algorithms::{allocate, allocate_address, resolve_pool, Allocation};
pub use config::{ConfigDocumentRef, ConfigError, IpamConfig, LoggingConfig};
pub use domain::{
    ClaimSet, ConfigurationSnapshot, LoadBalancerIngress, LoadBalancerStatus, PoolDefinition,
    PoolKey, PoolKind, ResolvedPool, ServiceRequest, LABEL_IMPLEMENTATION, LABEL_IPAM_ADDRESS,
};
pub use error::{IpamError, PoolError, StoreError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{ConfigStore, LoadBalancerApi, RequestStore};
pub use service::{ReconcileState, ReconciliationCoordinator, RetryPolicy, SyncOutcome};
pub use telemetry::{init_tracing, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
