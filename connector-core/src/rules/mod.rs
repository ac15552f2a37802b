//! Built-in rules

pub mod expire;
pub mod throughput;

pub use expire::ExpireRule;
pub use throughput::ThroughputRule;
