//! In-memory Configuration Store
//!
//! Implements `ConfigStore` over a map of documents keyed by
//! `(namespace, name)`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::domain::ConfigurationSnapshot;
use crate::error::StoreError;
use crate::ports::outbound::ConfigStore;

const KIND: &str = "configuration document";

#[derive(Default)]
pub struct InMemoryConfigStore {
    documents: RwLock<HashMap<(String, String), ConfigurationSnapshot>>,
    unavailable: AtomicBool,
    create_calls: AtomicU64,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one document.
    pub fn with_document(name: &str, namespace: &str, snapshot: ConfigurationSnapshot) -> Self {
        let store = Self::new();
        store.put_document(name, namespace, snapshot);
        store
    }

    /// Replace a document wholesale (administrator edit).
    pub fn put_document(&self, name: &str, namespace: &str, snapshot: ConfigurationSnapshot) {
        self.documents
            .write()
            .insert((namespace.to_string(), name.to_string()), snapshot);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `create_document` calls seen.
    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("configuration store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get_document(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ConfigurationSnapshot, StoreError> {
        self.check_available()?;

        self.documents
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create_document(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ConfigurationSnapshot, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut documents = self.documents.write();
        let snapshot = documents
            .entry((namespace.to_string(), name.to_string()))
            .or_insert_with(|| {
                info!("[vip-ipam] Created empty configuration document {}/{}", namespace, name);
                ConfigurationSnapshot::new()
            });
        Ok(snapshot.clone())
    }
}
