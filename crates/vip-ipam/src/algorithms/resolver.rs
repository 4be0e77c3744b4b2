//! # Pool Resolution
//!
//! Picks the pool governing a namespace from the configuration document.
//!
//! Lookup order (first hit wins, nothing is merged):
//!
//! ```text
//! cidr-<ns>  ->  cidr-global  ->  range-<ns>  ->  range-global
//! ```

use tracing::info;

use crate::domain::{ConfigurationSnapshot, PoolDefinition, PoolKey, ResolvedPool};
use crate::error::IpamError;

/// Resolve the pool for `namespace`.
///
/// Misses are informational; only running out of keys is an error.
pub fn resolve_pool(
    namespace: &str,
    snapshot: &ConfigurationSnapshot,
) -> Result<ResolvedPool, IpamError> {
    for key in PoolKey::lookup_order(namespace) {
        let Some(text) = snapshot.pool_entry(&key) else {
            info!(namespace, pool = %key, "[vip-ipam] No pool configured under key");
            continue;
        };

        info!(namespace, pool = %key, "[vip-ipam] Taking address from pool");
        let definition =
            PoolDefinition::from_entry(key.kind, text).map_err(|reason| IpamError::InvalidPool {
                pool: key.to_string(),
                reason,
            })?;
        return Ok(ResolvedPool { key, definition });
    }

    Err(IpamError::PoolNotFound {
        namespace: namespace.to_string(),
    })
}
