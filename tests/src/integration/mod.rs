//! Cross-component integration flows.

pub mod allocation_flows;
pub mod concurrency;
