//! # Pool Definitions
//!
//! Address pools as administrators write them into the configuration
//! document, and the numeric spans they expand to.
//!
//! ## Key Scheme
//!
//! | Key               | Meaning                               |
//! |-------------------|---------------------------------------|
//! | `cidr-<ns>`       | CIDR block governing namespace `ns`   |
//! | `cidr-global`     | fallback CIDR block                   |
//! | `range-<ns>`      | `<start>-<end>` range for `ns`        |
//! | `range-global`    | fallback range                        |

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::PoolError;

/// Scope name used by the fallback keys.
pub const GLOBAL_SCOPE: &str = "global";

/// The two pool shapes understood by the allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Cidr,
    Range,
}

impl PoolKind {
    /// Key prefix in the configuration document.
    pub fn prefix(&self) -> &'static str {
        match self {
            PoolKind::Cidr => "cidr",
            PoolKind::Range => "range",
        }
    }
}

/// Whether a pool applies to one namespace or to all of them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PoolScope {
    Namespace(String),
    Global,
}

/// A key in the configuration document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub kind: PoolKind,
    pub scope: PoolScope,
}

impl PoolKey {
    pub fn namespaced(kind: PoolKind, namespace: impl Into<String>) -> Self {
        Self {
            kind,
            scope: PoolScope::Namespace(namespace.into()),
        }
    }

    pub fn global(kind: PoolKind) -> Self {
        Self {
            kind,
            scope: PoolScope::Global,
        }
    }

    /// Keys consulted for `namespace`, in precedence order.
    ///
    /// CIDR pools always win over ranges; within a kind the namespace key
    /// wins over the global one.
    pub fn lookup_order(namespace: &str) -> [PoolKey; 4] {
        [
            PoolKey::namespaced(PoolKind::Cidr, namespace),
            PoolKey::global(PoolKind::Cidr),
            PoolKey::namespaced(PoolKind::Range, namespace),
            PoolKey::global(PoolKind::Range),
        ]
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            PoolScope::Namespace(ns) => write!(f, "{}-{}", self.kind.prefix(), ns),
            PoolScope::Global => write!(f, "{}-{}", self.kind.prefix(), GLOBAL_SCOPE),
        }
    }
}

/// Pool text as found in the configuration document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolDefinition {
    /// A CIDR block such as `192.168.1.0/24`.
    Cidr { block: String },
    /// An inclusive range such as `10.0.0.10-10.0.0.20`.
    Range { start: String, end: String },
}

impl PoolDefinition {
    pub fn cidr(block: impl Into<String>) -> Self {
        PoolDefinition::Cidr {
            block: block.into(),
        }
    }

    pub fn range(start: impl Into<String>, end: impl Into<String>) -> Self {
        PoolDefinition::Range {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Interpret a configuration entry of the given kind.
    ///
    /// Range text is split on the first `-`; IPv6 addresses never contain one.
    pub fn from_entry(kind: PoolKind, text: &str) -> Result<Self, PoolError> {
        let text = text.trim();
        match kind {
            PoolKind::Cidr => Ok(Self::cidr(text)),
            PoolKind::Range => text
                .split_once('-')
                .map(|(start, end)| Self::range(start.trim(), end.trim()))
                .ok_or_else(|| PoolError::MissingRangeSeparator(text.to_string())),
        }
    }

    pub fn kind(&self) -> PoolKind {
        match self {
            PoolDefinition::Cidr { .. } => PoolKind::Cidr,
            PoolDefinition::Range { .. } => PoolKind::Range,
        }
    }

    /// Expand the definition into its span of usable addresses.
    pub fn span(&self) -> Result<AddressSpan, PoolError> {
        match self {
            PoolDefinition::Cidr { block } => cidr_span(block),
            PoolDefinition::Range { start, end } => range_span(start, end),
        }
    }
}

impl fmt::Display for PoolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolDefinition::Cidr { block } => write!(f, "{}", block),
            PoolDefinition::Range { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

/// A pool definition together with the key it was found under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPool {
    pub key: PoolKey,
    pub definition: PoolDefinition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpFamily::V4,
            IpAddr::V6(_) => IpFamily::V6,
        }
    }

    /// Rebuild an address of this family from its numeric value.
    pub fn addr(&self, value: u128) -> IpAddr {
        match self {
            IpFamily::V4 => IpAddr::V4(Ipv4Addr::from(value as u32)),
            IpFamily::V6 => IpAddr::V6(Ipv6Addr::from(value)),
        }
    }
}

/// Inclusive numeric span of candidate addresses within one family.
///
/// INVARIANT: `first <= last`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressSpan {
    pub family: IpFamily,
    pub first: u128,
    pub last: u128,
}

impl AddressSpan {
    pub fn first_addr(&self) -> IpAddr {
        self.family.addr(self.first)
    }

    pub fn last_addr(&self) -> IpAddr {
        self.family.addr(self.last)
    }

    /// Number of candidate addresses, saturating for a full IPv6 space.
    pub fn len(&self) -> u128 {
        (self.last - self.first).saturating_add(1)
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        IpFamily::of(addr) == self.family && (self.first..=self.last).contains(&to_u128(addr))
    }
}

pub(crate) fn to_u128(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(*v4) as u128,
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn cidr_span(block: &str) -> Result<AddressSpan, PoolError> {
    let net: IpNet = block
        .trim()
        .parse()
        .map_err(|_| PoolError::MalformedCidr(block.to_string()))?;
    let net = net.trunc();

    let (family, network, broadcast, prefix_len, max_prefix) = match net {
        IpNet::V4(n) => (
            IpFamily::V4,
            u32::from(n.network()) as u128,
            u32::from(n.broadcast()) as u128,
            n.prefix_len(),
            32,
        ),
        IpNet::V6(n) => (
            IpFamily::V6,
            u128::from(n.network()),
            u128::from(n.broadcast()),
            n.prefix_len(),
            128,
        ),
    };

    // Point-to-point (/31, /127) and single-host blocks have no reserved addresses.
    let reserved = prefix_len + 1 < max_prefix;
    let (first, last) = match (reserved, family) {
        (false, _) => (network, broadcast),
        (true, IpFamily::V4) => (network + 1, broadcast - 1),
        // IPv6 has no broadcast; only the subnet-router anycast address is reserved.
        (true, IpFamily::V6) => (network + 1, broadcast),
    };

    if first > last {
        return Err(PoolError::NoUsableHosts(net.to_string()));
    }

    Ok(AddressSpan {
        family,
        first,
        last,
    })
}

fn range_span(start: &str, end: &str) -> Result<AddressSpan, PoolError> {
    let start_addr: IpAddr = start
        .trim()
        .parse()
        .map_err(|_| PoolError::MalformedAddress(start.to_string()))?;
    let end_addr: IpAddr = end
        .trim()
        .parse()
        .map_err(|_| PoolError::MalformedAddress(end.to_string()))?;

    let family = IpFamily::of(&start_addr);
    if family != IpFamily::of(&end_addr) {
        return Err(PoolError::MixedFamilies {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let (first, last) = (to_u128(&start_addr), to_u128(&end_addr));
    if first > last {
        return Err(PoolError::InvertedRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    Ok(AddressSpan {
        family,
        first,
        last,
    })
}
