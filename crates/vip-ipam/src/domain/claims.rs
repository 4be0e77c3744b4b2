//! # Claim Set
//!
//! Addresses already bound to other requests, read fresh for every
//! reconciliation and handed to the allocator as a plain value.

use std::collections::BTreeSet;
use std::net::IpAddr;

use tracing::warn;

use super::entities::ServiceRequest;

/// Set of claimed addresses.
///
/// Membership compares parsed addresses, so `fd00::1` and `fd00:0::1` are the
/// same claim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimSet {
    addresses: BTreeSet<IpAddr>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the `ipam-address` label of every request.
    pub fn from_requests<'a, I>(requests: I) -> Self
    where
        I: IntoIterator<Item = &'a ServiceRequest>,
    {
        let mut claims = Self::new();
        for request in requests {
            if let Some(value) = request.ipam_address() {
                claims.insert_label(&request.key(), value);
            }
        }
        claims
    }

    pub fn insert(&mut self, addr: IpAddr) -> bool {
        self.addresses.insert(addr)
    }

    fn insert_label(&mut self, owner: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match value.parse::<IpAddr>() {
            Ok(addr) => {
                self.addresses.insert(addr);
            }
            Err(_) => warn!(
                service = %owner,
                label = %value,
                "[vip-ipam] Ignoring unparsable ipam-address label"
            ),
        }
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.addresses.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Claimed addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &IpAddr> {
        self.addresses.iter()
    }
}

impl FromIterator<IpAddr> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
        }
    }
}
