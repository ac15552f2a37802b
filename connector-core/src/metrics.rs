//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the pipeline.
//!
//! # Metrics
//!
//! - `connector_incoming_packets_total` - Prepare packets received
//! - `connector_incoming_packet_value_total` - Sum of received amounts
//! - `connector_outgoing_packets_total` - Prepare packets handed to the forwarder
//! - `connector_outgoing_packet_value_total` - Sum of forwarded amounts
//! - `connector_rate_limited_packets_total` - Packets refused by a throughput bucket, by direction
//! - `connector_rate_limited_money_total` - Amount refused by a throughput bucket, by direction
//! - `connector_rejects_total` - Rejects generated at the boundary, by code
//!
//! Collectors are registered on an instance-owned [`Registry`], so several
//! pipelines (or tests) can coexist in one process.

use crate::{error::ErrorCode, types::Direction};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Prepare packets received
    pub incoming_packets: IntCounter,

    /// Sum of received amounts
    pub incoming_value: IntCounter,

    /// Prepare packets forwarded
    pub outgoing_packets: IntCounter,

    /// Sum of forwarded amounts
    pub outgoing_value: IntCounter,

    /// Throttled packets by direction
    pub rate_limited_packets: IntCounterVec,

    /// Throttled amount by direction
    pub rate_limited_money: IntCounterVec,

    /// Boundary rejects by code
    pub rejects: IntCounterVec,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let incoming_packets = IntCounter::new(
            "connector_incoming_packets_total",
            "Total number of incoming prepare packets",
        )?;
        registry.register(Box::new(incoming_packets.clone()))?;

        let incoming_value = IntCounter::new(
            "connector_incoming_packet_value_total",
            "Total value of incoming prepare packets",
        )?;
        registry.register(Box::new(incoming_value.clone()))?;

        let outgoing_packets = IntCounter::new(
            "connector_outgoing_packets_total",
            "Total number of forwarded prepare packets",
        )?;
        registry.register(Box::new(outgoing_packets.clone()))?;

        let outgoing_value = IntCounter::new(
            "connector_outgoing_packet_value_total",
            "Total value of forwarded prepare packets",
        )?;
        registry.register(Box::new(outgoing_value.clone()))?;

        let rate_limited_packets = IntCounterVec::new(
            Opts::new(
                "connector_rate_limited_packets_total",
                "Total number of rate limited packets",
            ),
            &["direction"],
        )?;
        registry.register(Box::new(rate_limited_packets.clone()))?;

        let rate_limited_money = IntCounterVec::new(
            Opts::new(
                "connector_rate_limited_money_total",
                "Total value of rate limited packets",
            ),
            &["direction"],
        )?;
        registry.register(Box::new(rate_limited_money.clone()))?;

        let rejects = IntCounterVec::new(
            Opts::new(
                "connector_rejects_total",
                "Total number of rejects generated by this node",
            ),
            &["code"],
        )?;
        registry.register(Box::new(rejects.clone()))?;

        Ok(Self {
            incoming_packets,
            incoming_value,
            outgoing_packets,
            outgoing_value,
            rate_limited_packets,
            rate_limited_money,
            rejects,
            registry,
        })
    }

    /// Record a received prepare
    pub fn record_incoming(&self, amount: u64) {
        self.incoming_packets.inc();
        self.incoming_value.inc_by(amount);
    }

    /// Record a prepare handed to the forwarder
    pub fn record_outgoing(&self, amount: u64) {
        self.outgoing_packets.inc();
        self.outgoing_value.inc_by(amount);
    }

    /// Record a packet refused by a throughput bucket
    pub fn record_throttled(&self, direction: Direction, amount: u64) {
        self.rate_limited_packets
            .with_label_values(&[direction.as_str()])
            .inc();
        self.rate_limited_money
            .with_label_values(&[direction.as_str()])
            .inc_by(amount);
    }

    /// Record a reject produced at the boundary
    pub fn record_reject(&self, code: ErrorCode) {
        self.rejects.with_label_values(&[code.as_str()]).inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
        // A second instance must not collide with the first
        assert!(Metrics::new().is_ok());
    }

    #[test]
    fn test_record_and_gather() {
        let metrics = Metrics::new().unwrap();
        metrics.record_incoming(100);
        metrics.record_incoming(50);
        metrics.record_throttled(Direction::Incoming, 7);
        metrics.record_outgoing(40);

        assert_eq!(metrics.incoming_packets.get(), 2);
        assert_eq!(metrics.incoming_value.get(), 150);
        assert_eq!(metrics.outgoing_packets.get(), 1);
        assert_eq!(metrics.outgoing_value.get(), 40);
        assert_eq!(
            metrics.rate_limited_money.with_label_values(&["incoming"]).get(),
            7
        );

        let text = metrics.gather_text();
        assert!(text.contains("connector_incoming_packets_total 2"));
    }
}
