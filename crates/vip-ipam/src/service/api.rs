//! `LoadBalancerApi` implementation for the coordinator.

use async_trait::async_trait;
use tracing::debug;

use super::core::ReconciliationCoordinator;
use crate::domain::{LoadBalancerStatus, ServiceRequest};
use crate::error::IpamError;
use crate::ports::inbound::LoadBalancerApi;
use crate::ports::outbound::{ConfigStore, RequestStore};

#[async_trait]
impl<R: RequestStore, C: ConfigStore> LoadBalancerApi for ReconciliationCoordinator<R, C> {
    async fn ensure_load_balancer(
        &self,
        cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<LoadBalancerStatus, IpamError> {
        debug!(cluster = cluster_name, service = %request.key(), "[vip-ipam] Ensure load balancer");
        let outcome = self.sync_load_balancer(request, self.cancellation()).await?;
        Ok(outcome.request.status)
    }

    async fn update_load_balancer(
        &self,
        cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<(), IpamError> {
        debug!(cluster = cluster_name, service = %request.key(), "[vip-ipam] Update load balancer");
        self.sync_load_balancer(request, self.cancellation()).await?;
        Ok(())
    }

    async fn ensure_load_balancer_deleted(
        &self,
        cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<(), IpamError> {
        debug!(cluster = cluster_name, service = %request.key(), "[vip-ipam] Ensure load balancer deleted");
        self.release(request);
        Ok(())
    }

    async fn get_load_balancer(
        &self,
        _cluster_name: &str,
        request: &ServiceRequest,
    ) -> Result<(Option<LoadBalancerStatus>, bool), IpamError> {
        if request.is_managed_by(&self.config().allocator_id) {
            Ok((Some(request.status.clone()), true))
        } else {
            Ok((None, false))
        }
    }

    fn get_load_balancer_name(&self, _cluster_name: &str, request: &ServiceRequest) -> String {
        request.default_load_balancer_name()
    }
}
