//! # Domain Entities
//!
//! The load-balancer service request as seen by the allocator, and the
//! configuration document that carries pool definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pool::PoolKey;

/// Label marking requests managed by an allocator (`implementation=<id>`).
pub const LABEL_IMPLEMENTATION: &str = "implementation";

/// Label recording the claimed address (`ipam-address=<addr>`).
pub const LABEL_IPAM_ADDRESS: &str = "ipam-address";

/// Maximum length of a generated load-balancer name.
pub const MAX_LOAD_BALANCER_NAME_LEN: usize = 32;

/// One ingress point of a load balancer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerIngress {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Status block of a load-balancer request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerStatus {
    #[serde(default)]
    pub ingress: Vec<LoadBalancerIngress>,
}

/// A load-balancer service request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Empty until the allocator binds an address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_address: Option<String>,
    /// Store-managed version used for optimistic concurrency.
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default)]
    pub status: LoadBalancerStatus,
}

impl ServiceRequest {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_assigned_address(mut self, address: impl Into<String>) -> Self {
        self.assigned_address = Some(address.into());
        self
    }

    /// `namespace/name`, for logs.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// A bound request is never re-assigned.
    pub fn is_bound(&self) -> bool {
        self.assigned_address
            .as_deref()
            .is_some_and(|addr| !addr.trim().is_empty())
    }

    pub fn ipam_address(&self) -> Option<&str> {
        self.labels.get(LABEL_IPAM_ADDRESS).map(String::as_str)
    }

    pub fn is_managed_by(&self, allocator_id: &str) -> bool {
        self.labels.get(LABEL_IMPLEMENTATION).map(String::as_str) == Some(allocator_id)
    }

    /// Stamp ownership label, address label and assigned address in one go.
    pub fn bind(&mut self, allocator_id: &str, address: &str) {
        self.labels
            .insert(LABEL_IMPLEMENTATION.to_string(), allocator_id.to_string());
        self.labels
            .insert(LABEL_IPAM_ADDRESS.to_string(), address.to_string());
        self.assigned_address = Some(address.to_string());
    }

    /// Name of the backing load balancer: `a` + uid without dashes, capped
    /// at 32 characters.
    pub fn default_load_balancer_name(&self) -> String {
        let mut name: String = std::iter::once('a')
            .chain(self.uid.chars().filter(|c| *c != '-'))
            .collect();
        if let Some((idx, _)) = name.char_indices().nth(MAX_LOAD_BALANCER_NAME_LEN) {
            name.truncate(idx);
        }
        name
    }
}

/// Point-in-time copy of the pool configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

impl ConfigurationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn pool_entry(&self, key: &PoolKey) -> Option<&str> {
        self.get(&key.to_string())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<BTreeMap<String, String>> for ConfigurationSnapshot {
    fn from(data: BTreeMap<String, String>) -> Self {
        Self { data }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigurationSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
