//! In-memory Request Store
//!
//! Implements `RequestStore` with resource-version checks, so optimistic
//! concurrency behaves like a real object store. Fault-injection hooks let
//! tests force version conflicts and connectivity failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::ServiceRequest;
use crate::error::StoreError;
use crate::ports::outbound::RequestStore;

const KIND: &str = "service";

/// In-memory request store keyed by `(namespace, name)`.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<(String, String), ServiceRequest>>,
    /// Number of upcoming updates to reject with a version conflict.
    injected_conflicts: AtomicU32,
    unavailable: AtomicBool,
    update_calls: AtomicU64,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a request, returning the stored copy.
    ///
    /// New requests start at version 1; replacements bump the version.
    pub fn insert(&self, mut request: ServiceRequest) -> ServiceRequest {
        let key = (request.namespace.clone(), request.name.clone());
        let mut requests = self.requests.write();
        request.resource_version = requests
            .get(&key)
            .map_or(1, |existing| existing.resource_version + 1);
        requests.insert(key, request.clone());
        request
    }

    pub fn remove(&self, namespace: &str, name: &str) -> Option<ServiceRequest> {
        self.requests
            .write()
            .remove(&(namespace.to_string(), name.to_string()))
    }

    /// Current stored copy, bypassing fault injection.
    pub fn peek(&self, namespace: &str, name: &str) -> Option<ServiceRequest> {
        self.requests
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.requests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.read().is_empty()
    }

    /// Reject the next `n` updates as if another writer got there first.
    pub fn fail_next_updates_with_conflict(&self, n: u32) {
        self.injected_conflicts.store(n, Ordering::SeqCst);
    }

    /// Make every call fail with a connection error until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `update` calls seen, including rejected ones.
    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("request store unavailable".to_string()));
        }
        Ok(())
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Match labels against a `key=value[,key=value]` selector.
///
/// A bare `key` term only requires the label to exist; an empty selector
/// matches everything.
pub fn matches_selector(request: &ServiceRequest, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => {
                request.labels.get(key.trim()).map(String::as_str) == Some(value.trim())
            }
            None => request.labels.contains_key(term),
        })
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        self.check_available()?;

        let requests = self.requests.read();
        let mut matched: Vec<ServiceRequest> = requests
            .values()
            .filter(|r| r.namespace == namespace && matches_selector(r, label_selector))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(
            "[vip-ipam] Listed {} requests in {} matching [{}]",
            matched.len(),
            namespace,
            label_selector
        );
        Ok(matched)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<ServiceRequest, StoreError> {
        self.check_available()?;

        self.peek(namespace, name).ok_or_else(|| StoreError::NotFound {
            kind: KIND,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    async fn update(&self, mut request: ServiceRequest) -> Result<ServiceRequest, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let key = (request.namespace.clone(), request.name.clone());
        let mut requests = self.requests.write();
        let stored = requests.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            kind: KIND,
            namespace: request.namespace.clone(),
            name: request.name.clone(),
        })?;

        if self.take_injected_conflict() {
            // Simulate a competing writer: the stored version moves on.
            stored.resource_version += 1;
        }

        if stored.resource_version != request.resource_version {
            return Err(StoreError::VersionConflict {
                name: request.key(),
                expected: request.resource_version,
                actual: stored.resource_version,
            });
        }

        request.resource_version += 1;
        *stored = request.clone();
        Ok(request)
    }
}
