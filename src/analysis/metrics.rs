//! Loss and latency statistics over reconstructed delivery paths.
//!
//! Pure derivation: the same sends and paths always reduce to the same
//! buckets, so aggregation can be re-run at will.

use std::collections::{BTreeMap, HashSet};

use super::types::*;
use crate::config::ExperimentSetup;

/// Round to the artifact's fixed two-decimal precision.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of integer delays, 0 when empty.
fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

impl MetricsBucket {
    /// Build a bucket from raw counts and the delays of its paths.
    ///
    /// Duplicate deliveries can push `received` above `sent`, which reads as
    /// zero loss rather than a negative percentage.
    pub fn from_counts(sent_count: usize, received_count: usize, delays: Vec<i64>) -> Self {
        let loss_percent = if sent_count == 0 {
            0.0
        } else {
            let raw = (sent_count as f64 - received_count as f64) / sent_count as f64 * 100.0;
            round2(raw.clamp(0.0, 100.0))
        };

        let avg_delay_ms = round2(mean(&delays));

        Self {
            sent_count,
            received_count,
            loss_percent,
            delays,
            avg_delay_ms,
        }
    }
}

/// Reduce the sender's send events and the delivery paths into overall,
/// per-block and per-receiver buckets.
///
/// A send counts once per intended target. Per-receiver sends are counted by
/// target address; for a receiver whose address is unknown, target
/// attribution is impossible and the declared block count stands in.
pub fn aggregate_metrics(
    sender: &NodeLog,
    receivers: &[NodeLog],
    paths: &[DeliveryPath],
    setup: &ExperimentSetup,
) -> AggregatedMetrics {
    let sends: Vec<&SendEvent> = sender
        .send_events
        .iter()
        .filter(|s| setup.block_in_range(s.block_id))
        .collect();

    let overall = MetricsBucket::from_counts(
        sends.len(),
        paths.len(),
        paths.iter().map(|p| p.delay_ms).collect(),
    );

    // Per block: every declared block gets a row, sent or not
    let mut per_block = BTreeMap::new();
    for block_id in 1..=setup.max_block {
        let sent = sends.iter().filter(|s| s.block_id == block_id).count();
        let block_paths: Vec<&DeliveryPath> =
            paths.iter().filter(|p| p.block_id == block_id).collect();
        per_block.insert(
            block_id,
            MetricsBucket::from_counts(
                sent,
                block_paths.len(),
                block_paths.iter().map(|p| p.delay_ms).collect(),
            ),
        );
    }

    // Per receiver, keyed by address or synthetic label
    let mut per_receiver = BTreeMap::new();
    for receiver in receivers {
        let label = receiver.label();
        let sent = match &receiver.node_addr {
            Some(addr) => sends.iter().filter(|s| &s.target_addr == addr).count(),
            None => setup.max_block as usize,
        };
        let receiver_paths: Vec<&DeliveryPath> =
            paths.iter().filter(|p| p.receiver_addr == label).collect();
        per_receiver.insert(
            label,
            MetricsBucket::from_counts(
                sent,
                receiver_paths.len(),
                receiver_paths.iter().map(|p| p.delay_ms).collect(),
            ),
        );
    }

    AggregatedMetrics {
        overall,
        per_block,
        per_receiver,
        reported_delay_per_block: reported_delays_by_block(receivers, setup),
    }
}

/// Mean of the delays the workload itself reported, grouped by block.
///
/// Independent of correlation; useful as a cross-check against the delays
/// derived from timestamp matching.
fn reported_delays_by_block(receivers: &[NodeLog], setup: &ExperimentSetup) -> BTreeMap<u32, f64> {
    let mut by_block: BTreeMap<u32, Vec<i64>> = BTreeMap::new();

    for receiver in receivers {
        for recv in &receiver.receive_events {
            if recv.source_addr != setup.sender_addr || !setup.block_in_range(recv.block_id) {
                continue;
            }
            by_block
                .entry(recv.block_id)
                .or_default()
                .push(recv.reported_delay_ms as i64);
        }
    }

    by_block
        .into_iter()
        .map(|(block_id, delays)| (block_id, round2(mean(&delays))))
        .collect()
}

/// Summarize a duplicate-preserving correlation for loss auditing.
pub fn build_delivery_audit(paths: &[DeliveryPath]) -> DeliveryAudit {
    let mut receptions_per_block: BTreeMap<u32, usize> = BTreeMap::new();
    let mut receptions_per_receiver: BTreeMap<String, usize> = BTreeMap::new();
    let mut distinct: HashSet<(u32, LogTime, &str)> = HashSet::new();

    for path in paths {
        *receptions_per_block.entry(path.block_id).or_insert(0) += 1;
        *receptions_per_receiver
            .entry(path.receiver_addr.clone())
            .or_insert(0) += 1;
        distinct.insert((path.block_id, path.send_time, path.receiver_addr.as_str()));
    }

    DeliveryAudit {
        total_receptions: paths.len(),
        duplicate_receptions: paths.len() - distinct.len(),
        receptions_per_block,
        receptions_per_receiver,
    }
}
