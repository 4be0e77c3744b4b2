//! Outbound Ports (Driven Ports)
//!
//! Stores the allocator depends on. Calls are the only suspension points of a
//! reconciliation.

use async_trait::async_trait;

use crate::domain::{ConfigurationSnapshot, ServiceRequest};
use crate::error::StoreError;

/// Store holding load-balancer service requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// List requests in `namespace` matching a `key=value[,key=value]` selector.
    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ServiceRequest>, StoreError>;

    /// Fetch the latest version of one request.
    async fn get(&self, namespace: &str, name: &str) -> Result<ServiceRequest, StoreError>;

    /// Write a request back.
    ///
    /// Fails with [`StoreError::VersionConflict`] if the stored version moved
    /// since `request` was read.
    async fn update(&self, request: ServiceRequest) -> Result<ServiceRequest, StoreError>;
}

/// Store holding the pool configuration document.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the document; [`StoreError::NotFound`] if absent.
    async fn get_document(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ConfigurationSnapshot, StoreError>;

    /// Idempotent upsert: creates an empty document, or returns the existing
    /// one untouched.
    async fn create_document(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ConfigurationSnapshot, StoreError>;
}
