//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - the load-balancer surface the host runtime calls
//! - Driven Ports (outbound) - the request store and the configuration store

pub mod inbound;
pub mod outbound;

pub use inbound::LoadBalancerApi;
pub use outbound::{ConfigStore, RequestStore};
