//! Error types for the VIP allocation subsystem

use thiserror::Error;

/// Errors raised while turning pool text into a usable address span.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("malformed CIDR block: {0:?}")]
    MalformedCidr(String),

    #[error("malformed address: {0:?}")]
    MalformedAddress(String),

    #[error("range {0:?} is not of the form <start>-<end>")]
    MissingRangeSeparator(String),

    #[error("range mixes address families: {start} - {end}")]
    MixedFamilies { start: String, end: String },

    #[error("range start {start} is greater than end {end}")]
    InvertedRange { start: String, end: String },

    #[error("block {0} has no usable host addresses")]
    NoUsableHosts(String),
}

/// Errors surfaced by the request and configuration stores.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("version conflict on {name}: expected {expected}, found {actual}")]
    VersionConflict {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("store connection error: {0}")]
    Connection(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Failures of a single reconciliation attempt.
///
/// None of these leave a partially bound request behind: the bound fields of
/// a request are only written by one successful `update`.
#[derive(Debug, Error)]
pub enum IpamError {
    /// No pool is configured for the namespace, nor globally.
    #[error("no cidr or range pool configured for namespace {namespace} (or globally)")]
    PoolNotFound { namespace: String },

    /// The pool text could not be interpreted.
    #[error("invalid pool [{pool}]: {reason}")]
    InvalidPool {
        pool: String,
        #[source]
        reason: PoolError,
    },

    /// Every usable address in the pool is already claimed.
    #[error("no free address left in pool [{pool}]")]
    Exhausted { pool: String },

    /// Optimistic write kept conflicting until the retry budget ran out.
    #[error("failed to persist address on service {name} after {attempts} attempts")]
    PersistenceFailed { name: String, attempts: u32 },

    #[error("reconciliation of service {name} cancelled")]
    Cancelled { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IpamError {
    /// Whether the caller can expect a later retry to succeed without an
    /// administrator changing the pool definitions.
    pub fn is_retryable(&self) -> bool {
        match self {
            IpamError::PoolNotFound { .. } => true,
            IpamError::InvalidPool { .. } | IpamError::Exhausted { .. } => false,
            IpamError::PersistenceFailed { .. } | IpamError::Cancelled { .. } => true,
            IpamError::Store(_) => true,
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IpamError::PoolNotFound { .. } => "pool_not_found",
            IpamError::InvalidPool { .. } => "invalid_pool",
            IpamError::Exhausted { .. } => "exhausted",
            IpamError::PersistenceFailed { .. } => "persistence_failed",
            IpamError::Cancelled { .. } => "cancelled",
            IpamError::Store(_) => "store",
        }
    }
}
