//! Core reconciliation flow.
//!
//! ```text
//! [UNBOUND] ──already bound──────────────────────────────────→ [BOUND]
//!     │
//!     └─→ [RESOLVING] ─→ [ALLOCATING] ─→ [PERSISTING] ──write ok──→ [BOUND]
//!              │              │               │
//!              └──────────────┴───────────────┴──error──→ [FAILED]
//! ```
//!
//! Claims and configuration are read fresh on every attempt; nothing is
//! cached between reconciliations.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::algorithms::{allocate_address, resolve_pool};
use crate::config::IpamConfig;
use crate::domain::{ClaimSet, ConfigurationSnapshot, ServiceRequest};
use crate::error::IpamError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::outbound::{ConfigStore, RequestStore};

/// Reconciliation state of one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    Unbound,
    Resolving,
    Allocating,
    Persisting,
    Bound,
    Failed,
}

impl ReconcileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcileState::Bound | ReconcileState::Failed)
    }
}

/// Result of a successful reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Address now bound to the request.
    pub address: String,
    /// `false` when the request was already bound and nothing was written.
    pub newly_bound: bool,
    /// The request as last seen in the store.
    pub request: ServiceRequest,
}

/// Coordinates claim gathering, pool resolution, allocation and the
/// optimistic write for load-balancer requests.
///
/// Safe to call from many tasks at once; see the crate docs for the race
/// this does *not* close.
pub struct ReconciliationCoordinator<R: RequestStore, C: ConfigStore> {
    requests: Arc<R>,
    config_store: Arc<C>,
    config: IpamConfig,
    metrics: Arc<dyn MetricsRecorder>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<R: RequestStore, C: ConfigStore> ReconciliationCoordinator<R, C> {
    pub fn new(requests: Arc<R>, config_store: Arc<C>, config: IpamConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            requests,
            config_store,
            config,
            metrics: Arc::new(NoOpMetrics),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Observe an external cancellation signal instead of the built-in one.
    pub fn with_shutdown(mut self, shutdown_rx: watch::Receiver<bool>) -> Self {
        self.shutdown_rx = shutdown_rx;
        self
    }

    pub fn config(&self) -> &IpamConfig {
        &self.config
    }

    /// Cancel in-flight and future reconciliations using the built-in signal.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Receiver for the signal the lifecycle API observes.
    pub fn cancellation(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Reconcile one request, observing `cancel` between write attempts.
    pub async fn sync_load_balancer(
        &self,
        request: &ServiceRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<SyncOutcome, IpamError> {
        let started = Instant::now();
        self.metrics.record_reconcile_started();
        info!(
            service = %request.key(),
            uid = %request.uid,
            "[vip-ipam] Syncing service"
        );

        let result = self.run_sync(request, &mut cancel).await;
        match &result {
            Ok(outcome) if outcome.newly_bound => self.metrics.record_bound(started.elapsed()),
            Ok(_) => {}
            Err(e) => {
                self.metrics.record_failure(e);
                self.transition(request, ReconcileState::Failed);
                warn!(
                    service = %request.key(),
                    kind = e.kind(),
                    retryable = e.is_retryable(),
                    "[vip-ipam] Reconciliation failed: {}",
                    e
                );
            }
        }
        result
    }

    async fn run_sync(
        &self,
        request: &ServiceRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<SyncOutcome, IpamError> {
        if let Some(address) = request.assigned_address.as_ref().filter(|_| request.is_bound()) {
            self.metrics.record_already_bound();
            self.transition(request, ReconcileState::Bound);
            debug!(
                service = %request.key(),
                address = %address,
                "[vip-ipam] Address already assigned, nothing to do"
            );
            return Ok(SyncOutcome {
                address: address.clone(),
                newly_bound: false,
                request: request.clone(),
            });
        }

        self.transition(request, ReconcileState::Resolving);
        let claims = self.claim_set(&request.namespace).await?;
        let snapshot = self.configuration().await?;

        self.transition(request, ReconcileState::Allocating);
        let pool = resolve_pool(&request.namespace, &snapshot)?;
        let address = allocate_address(&pool, &claims)?;

        self.transition(request, ReconcileState::Persisting);
        let outcome = self.persist(request, address, cancel).await?;

        self.transition(request, ReconcileState::Bound);
        Ok(outcome)
    }

    /// Addresses claimed by requests this allocator owns in `namespace`.
    pub async fn claim_set(&self, namespace: &str) -> Result<ClaimSet, IpamError> {
        let owned = self
            .requests
            .list(namespace, &self.config.ownership_selector())
            .await?;
        let claims = ClaimSet::from_requests(&owned);
        debug!(
            namespace,
            owned = owned.len(),
            claimed = claims.len(),
            "[vip-ipam] Built claim set"
        );
        Ok(claims)
    }

    /// Read the pool document, creating an empty one if it does not exist.
    pub async fn configuration(&self) -> Result<ConfigurationSnapshot, IpamError> {
        let doc = &self.config.config_document;
        match self.config_store.get_document(&doc.name, &doc.namespace).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) if e.is_not_found() => {
                warn!(
                    "[vip-ipam] Configuration document {}/{} missing, creating it",
                    doc.namespace, doc.name
                );
                Ok(self
                    .config_store
                    .create_document(&doc.name, &doc.namespace)
                    .await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Optimistic write loop: re-read, stamp, write; retry on conflict.
    async fn persist(
        &self,
        request: &ServiceRequest,
        address: IpAddr,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<SyncOutcome, IpamError> {
        let address = address.to_string();
        let max_attempts = self.config.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if *cancel.borrow() {
                return Err(IpamError::Cancelled {
                    name: request.key(),
                });
            }

            let mut latest = self.requests.get(&request.namespace, &request.name).await?;
            if let Some(existing) = latest.assigned_address.clone().filter(|_| latest.is_bound()) {
                // A concurrent reconciliation of this same request committed first.
                info!(
                    service = %request.key(),
                    address = %existing,
                    "[vip-ipam] Service was bound concurrently, keeping existing address"
                );
                return Ok(SyncOutcome {
                    address: existing,
                    newly_bound: false,
                    request: latest,
                });
            }

            info!(
                service = %request.key(),
                address = %address,
                attempt,
                "[vip-ipam] Updating service with load balancer IPAM address"
            );
            latest.bind(&self.config.allocator_id, &address);

            match self.requests.update(latest).await {
                Ok(updated) => {
                    return Ok(SyncOutcome {
                        address,
                        newly_bound: true,
                        request: updated,
                    })
                }
                Err(e) if e.is_conflict() => {
                    debug!(
                        service = %request.key(),
                        attempt,
                        max_attempts,
                        "[vip-ipam] Version conflict: {}",
                        e
                    );
                    if attempt < max_attempts {
                        self.metrics.record_conflict_retry();
                        let delay = self.config.retry.delay(attempt - 1);
                        if sleep_or_cancel(delay, cancel).await {
                            return Err(IpamError::Cancelled {
                                name: request.key(),
                            });
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(IpamError::PersistenceFailed {
            name: request.key(),
            attempts: max_attempts,
        })
    }

    /// Deletion only logs: the claim lapses once the request leaves the store.
    pub fn release(&self, request: &ServiceRequest) {
        self.metrics.record_deletion();
        info!(
            service = %request.key(),
            uid = %request.uid,
            address = request.ipam_address().unwrap_or(""),
            "[vip-ipam] Deleting service"
        );
    }

    fn transition(&self, request: &ServiceRequest, state: ReconcileState) {
        debug!(service = %request.key(), ?state, "[vip-ipam] Reconcile state");
    }
}

/// Sleep for `delay`, returning `true` early if cancellation is signalled.
async fn sleep_or_cancel(delay: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if *cancel.borrow() {
        return true;
    }

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = cancel.changed() => match changed {
                Ok(()) if *cancel.borrow() => return true,
                Ok(()) => continue,
                // Sender gone: nobody can cancel any more.
                Err(_) => {
                    sleep.as_mut().await;
                    return false;
                }
            },
        }
    }
}
