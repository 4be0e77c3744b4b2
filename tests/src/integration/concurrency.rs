//! # Concurrent Reconciliation
//!
//! Several workers reconciling at once: optimistic writes keep a single
//! request bound exactly once, while distinct requests racing on the same
//! pool can still pick the same address.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use vip_ipam::{
        ConfigurationSnapshot, InMemoryConfigStore, InMemoryRequestStore, IpamConfig,
        ReconciliationCoordinator, RequestStore, RetryPolicy, ServiceRequest, StoreError,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn pools(config: &IpamConfig, entries: &[(&str, &str)]) -> Arc<InMemoryConfigStore> {
        let snapshot: ConfigurationSnapshot = entries.iter().copied().collect();
        Arc::new(InMemoryConfigStore::with_document(
            &config.config_document.name,
            &config.config_document.namespace,
            snapshot,
        ))
    }

    fn config() -> IpamConfig {
        IpamConfig {
            retry: RetryPolicy {
                max_attempts: 20,
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
                ..RetryPolicy::default()
            },
            ..IpamConfig::new()
        }
    }

    /// Request store that hands control back to the scheduler after listing,
    /// widening the window between reading claims and writing the binding.
    struct YieldingRequestStore {
        inner: InMemoryRequestStore,
    }

    #[async_trait]
    impl RequestStore for YieldingRequestStore {
        async fn list(
            &self,
            namespace: &str,
            label_selector: &str,
        ) -> Result<Vec<ServiceRequest>, StoreError> {
            let listed = self.inner.list(namespace, label_selector).await;
            tokio::task::yield_now().await;
            listed
        }

        async fn get(&self, namespace: &str, name: &str) -> Result<ServiceRequest, StoreError> {
            self.inner.get(namespace, name).await
        }

        async fn update(&self, request: ServiceRequest) -> Result<ServiceRequest, StoreError> {
            self.inner.update(request).await
        }
    }

    // =============================================================================
    // TESTS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_request_from_many_workers_binds_once() -> Result<()> {
        let config = config();
        let requests = Arc::new(InMemoryRequestStore::new());
        let coordinator = Arc::new(ReconciliationCoordinator::new(
            requests.clone(),
            pools(&config, &[("cidr-default", "10.50.0.0/24")]),
            config,
        ));
        let request = requests.insert(ServiceRequest::new("default", "web"));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = coordinator.clone();
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .sync_load_balancer(&request, coordinator.cancellation())
                    .await
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await??);
        }

        let stored = requests.peek("default", "web").expect("request stored");
        let bound_to = stored.assigned_address.clone().expect("request bound");
        assert!(outcomes.iter().all(|o| o.address == bound_to));
        assert_eq!(outcomes.iter().filter(|o| o.newly_bound).count(), 1);
        assert_eq!(stored.ipam_address(), Some(bound_to.as_str()));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_requests_all_get_bound() -> Result<()> {
        let config = config();
        let requests = Arc::new(InMemoryRequestStore::new());
        let coordinator = Arc::new(ReconciliationCoordinator::new(
            requests.clone(),
            pools(&config, &[("range-global", "10.60.0.1-10.60.0.200")]),
            config,
        ));

        let mut handles = Vec::new();
        for i in 0..16 {
            let request = requests.insert(ServiceRequest::new("default", format!("svc-{i}")));
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .sync_load_balancer(&request, coordinator.cancellation())
                    .await
            }));
        }
        for handle in handles {
            handle.await??;
        }

        for i in 0..16 {
            let stored = requests
                .peek("default", &format!("svc-{i}"))
                .expect("request stored");
            assert!(stored.is_bound());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_unserialized_allocations_can_collide() -> Result<()> {
        let config = config();
        let store = Arc::new(YieldingRequestStore {
            inner: InMemoryRequestStore::new(),
        });
        let coordinator = ReconciliationCoordinator::new(
            store.clone(),
            pools(&config, &[("cidr-default", "10.70.0.0/24")]),
            config,
        );
        let a = store.inner.insert(ServiceRequest::new("default", "a"));
        let b = store.inner.insert(ServiceRequest::new("default", "b"));

        // Both read an empty claim set before either write lands.
        let (ra, rb) = tokio::join!(
            coordinator.sync_load_balancer(&a, coordinator.cancellation()),
            coordinator.sync_load_balancer(&b, coordinator.cancellation()),
        );

        assert_eq!(ra?.address, "10.70.0.1");
        assert_eq!(rb?.address, "10.70.0.1");
        Ok(())
    }
}
