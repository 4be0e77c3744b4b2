//! Inbound Ports (Driving Ports)
//!
//! The host orchestration runtime invokes these on create, update and delete
//! events for load-balancer requests.

use async_trait::async_trait;

use crate::domain::{LoadBalancerStatus, ServiceRequest};
use crate::error::IpamError;

/// Load-balancer lifecycle API (Driving Port)
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    /// Bind an address to the request if it has none yet.
    ///
    /// Already-bound requests are returned unchanged without any write.
    async fn ensure_load_balancer(
        &self,
        cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<LoadBalancerStatus, IpamError>;

    /// Same reconciliation as [`LoadBalancerApi::ensure_load_balancer`],
    /// discarding the status.
    async fn update_load_balancer(
        &self,
        cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<(), IpamError>;

    /// Deletion releases nothing explicitly; the claim disappears from the
    /// next claim set once the request is gone from the store.
    async fn ensure_load_balancer_deleted(
        &self,
        cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<(), IpamError>;

    /// Status of a request managed by this allocator.
    ///
    /// Returns `(None, false)` for requests without the ownership label.
    async fn get_load_balancer(
        &self,
        cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<(Option<LoadBalancerStatus>, bool), IpamError>;

    /// Name of the backing load balancer for a request.
    fn get_load_balancer_name(&self, cluster_name: &str, request: &ServiceRequest) -> String;
}
