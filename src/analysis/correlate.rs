//! Delivery-path reconstruction from send and receive events.
//!
//! The logs carry no correlation identifiers between a send and its
//! receptions, so matching is inferred from block identity, timestamps and
//! address fields. Every qualifying reception is first attributed to the
//! nearest preceding send of the same block; the canonical policy then keeps
//! only the nearest reception per (send, receiver), which absorbs
//! retransmission and duplicate-delivery noise. The duplicate-preserving
//! variant keeps them all and exists for loss auditing only.

use std::collections::{btree_map::Entry, BTreeMap, HashMap};

use rayon::prelude::*;

use super::types::*;
use crate::config::ExperimentSetup;

/// Send timestamps grouped by block id, restricted to events that can
/// participate in correlation (in-range block, timestamp present).
fn index_sends(sender: &NodeLog, setup: &ExperimentSetup) -> HashMap<u32, Vec<LogTime>> {
    let mut by_block: HashMap<u32, Vec<LogTime>> = HashMap::new();
    let mut discarded = 0usize;

    for send in &sender.send_events {
        if !setup.block_in_range(send.block_id) {
            discarded += 1;
            continue;
        }
        let Some(timestamp) = send.timestamp else {
            continue;
        };
        by_block.entry(send.block_id).or_default().push(timestamp);
    }

    if discarded > 0 {
        log::debug!("Discarded {} send events with out-of-range block ids", discarded);
    }

    by_block
}

/// Attribute each qualifying reception on one receiver to the nearest
/// preceding send of the same block, one path per reception.
///
/// A reception qualifies when its block id is in range, its source address
/// is the sender, it carries a timestamp, and at least one send of the same
/// block strictly precedes it. The resulting delay is always positive.
fn attribute_receptions(
    sends_by_block: &HashMap<u32, Vec<LogTime>>,
    receiver: &NodeLog,
    setup: &ExperimentSetup,
) -> Vec<DeliveryPath> {
    let receiver_addr = receiver.label();
    let mut paths = Vec::new();

    for recv in &receiver.receive_events {
        if recv.source_addr != setup.sender_addr || !setup.block_in_range(recv.block_id) {
            continue;
        }
        let Some(receive_time) = recv.timestamp else {
            continue;
        };
        let Some(sends) = sends_by_block.get(&recv.block_id) else {
            continue;
        };
        let Some(send_time) = sends
            .iter()
            .copied()
            .filter(|t| *t < receive_time)
            .max()
        else {
            continue;
        };

        paths.push(DeliveryPath {
            block_id: recv.block_id,
            sender_addr: setup.sender_addr.clone(),
            receiver_addr: receiver_addr.clone(),
            send_time,
            receive_time,
            delay_ms: receive_time - send_time,
        });
    }

    paths
}

/// Keep the nearest reception per (block, send) on one receiver.
///
/// Ties on delay are broken by smallest receive time, so the winner does not
/// depend on input order.
fn collapse_to_nearest(paths: Vec<DeliveryPath>) -> Vec<DeliveryPath> {
    let mut best: BTreeMap<(u32, LogTime), DeliveryPath> = BTreeMap::new();

    for path in paths {
        match best.entry((path.block_id, path.send_time)) {
            Entry::Vacant(slot) => {
                slot.insert(path);
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if (path.delay_ms, path.receive_time) < (current.delay_ms, current.receive_time) {
                    slot.insert(path);
                }
            }
        }
    }

    best.into_values().collect()
}

/// Reconstruct delivery paths using nearest-time matching.
///
/// For every send on the sender and every receiver, at most one path is
/// produced: the reception closest in time after the send. A send with no
/// qualifying reception on a receiver produces nothing for that pair; the
/// absence is what the aggregator counts as loss. Receivers are independent,
/// so they are processed in parallel and concatenated in index order.
pub fn correlate_nearest(
    sender: &NodeLog,
    receivers: &[NodeLog],
    setup: &ExperimentSetup,
) -> Vec<DeliveryPath> {
    let sends_by_block = index_sends(sender, setup);

    let paths: Vec<DeliveryPath> = receivers
        .par_iter()
        .map(|receiver| collapse_to_nearest(attribute_receptions(&sends_by_block, receiver, setup)))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    log::info!(
        "Correlated {} delivery paths across {} receivers",
        paths.len(),
        receivers.len()
    );

    paths
}

/// Reconstruct one delivery path for every reception, duplicates included.
///
/// Answers "how many distinct deliveries occurred" rather than "is the block
/// considered delivered", so retransmitted or duplicated blocks contribute
/// one path each. Used by the delivery audit, never by the default pipeline.
pub fn correlate_all_receptions(
    sender: &NodeLog,
    receivers: &[NodeLog],
    setup: &ExperimentSetup,
) -> Vec<DeliveryPath> {
    let sends_by_block = index_sends(sender, setup);

    receivers
        .par_iter()
        .map(|receiver| attribute_receptions(&sends_by_block, receiver, setup))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
