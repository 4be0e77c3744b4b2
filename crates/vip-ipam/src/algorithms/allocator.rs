//! # Address Allocation
//!
//! Lowest-free-address selection over a CIDR block or an inclusive range.
//!
//! ## Invariants
//!
//! - **Exclusion**: the returned address is never in the claim set.
//! - **Determinism**: equal inputs give the same address.
//! - **Lowest address**: the result is the smallest usable address not claimed.
//!
//! The scan stops after at most `claims.len() + 1` candidates, so huge IPv6
//! blocks cost no more than small ones.

use std::net::IpAddr;

use tracing::debug;

use crate::domain::{AddressSpan, ClaimSet, PoolDefinition, ResolvedPool};
use crate::error::{IpamError, PoolError};

/// Outcome of scanning one pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Allocation {
    Address(IpAddr),
    Exhausted,
}

/// Allocate from a raw pool definition.
pub fn allocate(definition: &PoolDefinition, claims: &ClaimSet) -> Result<Allocation, PoolError> {
    let span = definition.span()?;
    Ok(match first_free(&span, claims) {
        Some(addr) => Allocation::Address(addr),
        None => Allocation::Exhausted,
    })
}

/// Allocate from a resolved pool, mapping failures into [`IpamError`].
pub fn allocate_address(pool: &ResolvedPool, claims: &ClaimSet) -> Result<IpAddr, IpamError> {
    let pool_name = pool.key.to_string();
    match allocate(&pool.definition, claims) {
        Ok(Allocation::Address(addr)) => {
            debug!(pool = %pool_name, address = %addr, claimed = claims.len(), "[vip-ipam] Found free address");
            Ok(addr)
        }
        Ok(Allocation::Exhausted) => Err(IpamError::Exhausted { pool: pool_name }),
        Err(reason) => Err(IpamError::InvalidPool {
            pool: pool_name,
            reason,
        }),
    }
}

fn first_free(span: &AddressSpan, claims: &ClaimSet) -> Option<IpAddr> {
    let mut candidate = span.first;
    loop {
        let addr = span.family.addr(candidate);
        if !claims.contains(&addr) {
            return Some(addr);
        }
        if candidate == span.last {
            return None;
        }
        candidate += 1;
    }
}
