//! # Allocation Flows
//!
//! End-to-end reconciliation against the in-memory stores: pool bootstrap,
//! filling a pool, releasing claims, and moving between pools.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use vip_ipam::{
        ConfigurationSnapshot, InMemoryConfigStore, InMemoryRequestStore, IpamConfig, IpamError,
        LoadBalancerApi, Metrics, ReconciliationCoordinator, RetryPolicy, ServiceRequest,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const CLUSTER: &str = "integration";

    struct Env {
        requests: Arc<InMemoryRequestStore>,
        configs: Arc<InMemoryConfigStore>,
        metrics: Arc<Metrics>,
        coordinator: ReconciliationCoordinator<InMemoryRequestStore, InMemoryConfigStore>,
        config: IpamConfig,
    }

    fn env() -> Env {
        let config = IpamConfig {
            retry: RetryPolicy::immediate(5),
            ..IpamConfig::new()
        };
        let requests = Arc::new(InMemoryRequestStore::new());
        let configs = Arc::new(InMemoryConfigStore::new());
        let metrics = Arc::new(Metrics::new());
        let coordinator =
            ReconciliationCoordinator::new(requests.clone(), configs.clone(), config.clone())
                .with_metrics(metrics.clone());
        Env {
            requests,
            configs,
            metrics,
            coordinator,
            config,
        }
    }

    impl Env {
        fn set_pools(&self, entries: &[(&str, &str)]) {
            let snapshot: ConfigurationSnapshot = entries.iter().copied().collect();
            let doc = &self.config.config_document;
            self.configs.put_document(&doc.name, &doc.namespace, snapshot);
        }

        async fn create(&self, namespace: &str, name: &str) -> Result<String, IpamError> {
            let request = self.requests.insert(
                ServiceRequest::new(namespace, name).with_uid(format!("uid-{namespace}-{name}")),
            );
            self.coordinator.ensure_load_balancer(CLUSTER, &request).await?;
            Ok(self
                .requests
                .peek(namespace, name)
                .and_then(|r| r.assigned_address)
                .unwrap_or_default())
        }

        async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
            if let Some(request) = self.requests.remove(namespace, name) {
                self.coordinator
                    .ensure_load_balancer_deleted(CLUSTER, &request)
                    .await?;
            }
            Ok(())
        }
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_pool_added_after_first_failure() -> Result<()> {
        let env = env();

        let err = env.create("default", "web").await.unwrap_err();
        assert!(matches!(err, IpamError::PoolNotFound { .. }));
        assert!(err.is_retryable());
        assert_eq!(env.configs.create_calls(), 1);

        env.set_pools(&[("cidr-default", "192.168.1.0/30")]);

        let request = env.requests.peek("default", "web").expect("request stored");
        env.coordinator.ensure_load_balancer(CLUSTER, &request).await?;
        let bound = env.requests.peek("default", "web").expect("request stored");
        assert_eq!(bound.assigned_address.as_deref(), Some("192.168.1.1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_fill_pool_then_exhaust() -> Result<()> {
        let env = env();
        env.set_pools(&[("cidr-global", "10.20.0.0/29")]);

        let mut assigned = Vec::new();
        for i in 0..6 {
            assigned.push(env.create("default", &format!("svc-{i}")).await?);
        }
        assert_eq!(
            assigned,
            vec!["10.20.0.1", "10.20.0.2", "10.20.0.3", "10.20.0.4", "10.20.0.5", "10.20.0.6"]
        );

        let err = env.create("default", "svc-6").await.unwrap_err();
        assert!(matches!(err, IpamError::Exhausted { .. }));
        assert!(!err.is_retryable());

        env.delete("default", "svc-3").await?;
        assert_eq!(env.create("default", "svc-7").await?, "10.20.0.4");

        let snapshot = env.metrics.snapshot();
        assert_eq!(snapshot.addresses_bound, 7);
        assert_eq!(snapshot.failures_exhausted, 1);
        assert_eq!(snapshot.deletions, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_namespaces_allocate_independently_from_global_pool() -> Result<()> {
        let env = env();
        env.set_pools(&[("range-global", "10.30.0.10-10.30.0.20")]);

        // Claims are namespace-scoped, so both namespaces start at the bottom.
        assert_eq!(env.create("team-a", "web").await?, "10.30.0.10");
        assert_eq!(env.create("team-b", "web").await?, "10.30.0.10");
        assert_eq!(env.create("team-a", "api").await?, "10.30.0.11");
        Ok(())
    }

    #[tokio::test]
    async fn test_namespace_pool_overrides_global() -> Result<()> {
        let env = env();
        env.set_pools(&[
            ("cidr-global", "10.40.0.0/24"),
            ("cidr-edge", "10.41.0.0/24"),
            ("range-edge", "10.42.0.1-10.42.0.9"),
        ]);

        assert_eq!(env.create("edge", "ingress").await?, "10.41.0.1");
        assert_eq!(env.create("default", "ingress").await?, "10.40.0.1");
        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_noop() -> Result<()> {
        let env = env();
        env.set_pools(&[("cidr-default", "192.168.7.0/24")]);

        env.create("default", "web").await?;
        let calls_after_bind = env.requests.update_calls();

        let bound = env.requests.peek("default", "web").expect("request stored");
        env.coordinator.update_load_balancer(CLUSTER, &bound).await?;
        env.coordinator.update_load_balancer(CLUSTER, &bound).await?;

        assert_eq!(env.requests.update_calls(), calls_after_bind);
        assert_eq!(env.requests.peek("default", "web"), Some(bound));
        assert_eq!(env.metrics.snapshot().already_bound, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_pool_edit_does_not_move_bound_requests() -> Result<()> {
        let env = env();
        env.set_pools(&[("cidr-default", "192.168.8.0/24")]);
        env.create("default", "web").await?;

        env.set_pools(&[("cidr-default", "172.31.0.0/24")]);
        let bound = env.requests.peek("default", "web").expect("request stored");
        env.coordinator.ensure_load_balancer(CLUSTER, &bound).await?;

        let after = env.requests.peek("default", "web").expect("request stored");
        assert_eq!(after.assigned_address.as_deref(), Some("192.168.8.1"));
        assert_eq!(env.create("default", "api").await?, "172.31.0.1");
        Ok(())
    }
}
