//! # Domain Module
//!
//! Core types for the allocator: pools, claims and service requests.
//! No I/O happens here.

pub mod claims;
pub mod entities;
pub mod pool;

pub use claims::ClaimSet;
pub use entities::{
    ConfigurationSnapshot, LoadBalancerIngress, LoadBalancerStatus, ServiceRequest,
    LABEL_IMPLEMENTATION, LABEL_IPAM_ADDRESS, MAX_LOAD_BALANCER_NAME_LEN,
};
pub use pool::{
    AddressSpan, IpFamily, PoolDefinition, PoolKey, PoolKind, PoolScope, ResolvedPool,
    GLOBAL_SCOPE,
};
