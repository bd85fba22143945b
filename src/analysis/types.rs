//! Core data types for gossip experiment analysis.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Workload timestamp in milliseconds, from the `[time : N]` tag.
/// Only meaningful within a single node's log.
pub type LogTime = i64;

/// A block transmission recorded in the sender's log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEvent {
    pub block_id: u32,
    /// None when the line carried no timestamp tag
    pub timestamp: Option<LogTime>,
    pub target_addr: String,
}

/// A block reception recorded in a receiver's log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveEvent {
    pub block_id: u32,
    /// None when the line carried no timestamp tag
    pub timestamp: Option<LogTime>,
    pub source_addr: String,
    /// Delay as measured by the workload itself
    pub reported_delay_ms: u64,
    pub payload_len: u64,
}

/// All events parsed from a single node's log, in log order per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLog {
    pub node_index: u32,
    /// Address of this node, when the setup descriptor knows it
    pub node_addr: Option<String>,
    pub send_events: Vec<SendEvent>,
    pub receive_events: Vec<ReceiveEvent>,
}

impl NodeLog {
    pub fn new(node_index: u32, node_addr: Option<String>) -> Self {
        Self {
            node_index,
            node_addr,
            send_events: Vec::new(),
            receive_events: Vec::new(),
        }
    }

    /// Identity used in delivery paths and per-receiver tables:
    /// the node's address when known, else a synthetic `node-<index>` label.
    pub fn label(&self) -> String {
        match &self.node_addr {
            Some(addr) => addr.clone(),
            None => format!("node-{}", self.node_index),
        }
    }
}

/// A reconstructed (send, receive) pairing: one block reaching one receiver.
///
/// The two timestamps come from two different node logs, and the delay is
/// strictly positive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPath {
    pub block_id: u32,
    pub sender_addr: String,
    pub receiver_addr: String,
    pub send_time: LogTime,
    pub receive_time: LogTime,
    pub delay_ms: i64,
}

/// Counts and delays for one aggregation granularity
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsBucket {
    pub sent_count: usize,
    pub received_count: usize,
    /// (sent - received) / sent * 100, clamped to [0, 100]; 0 when sent = 0
    pub loss_percent: f64,
    pub delays: Vec<i64>,
    /// Mean of `delays`, 0 when empty
    pub avg_delay_ms: f64,
}

/// Output of the aggregation pass over sends and delivery paths
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetrics {
    pub overall: MetricsBucket,
    pub per_block: BTreeMap<u32, MetricsBucket>,
    pub per_receiver: BTreeMap<String, MetricsBucket>,
    /// Mean of the workload's own reported delays, grouped by block
    pub reported_delay_per_block: BTreeMap<u32, f64>,
}

/// Overall metrics table of the analysis artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total_sent: usize,
    pub total_received: usize,
    pub loss_percent: f64,
    pub avg_delay_ms: f64,
}

/// Per-block metrics table entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMetrics {
    pub loss_percent: f64,
    pub avg_delay_ms: f64,
    /// Mean of the delays the workload reported for this block
    pub avg_reported_delay_ms: f64,
}

/// Per-receiver metrics table entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverMetrics {
    pub sent: usize,
    pub received: usize,
    pub loss_percent: f64,
    pub avg_delay_ms: f64,
}

/// Artifact metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_timestamp: String,
    pub experiment_dir: String,
    pub max_block: u32,
    pub node_count: usize,
    pub total_send_events: usize,
    pub total_receive_events: usize,
}

/// Complete analysis artifact, serialized as analysis.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: AnalysisMetadata,
    /// Full parsed event lists, sender first
    pub nodes: Vec<NodeLog>,
    pub overall: OverallMetrics,
    pub per_block: BTreeMap<u32, BlockMetrics>,
    pub per_receiver: BTreeMap<String, ReceiverMetrics>,
}

/// Duplicate-preserving delivery audit, serialized as delivery_audit.json.
///
/// Counts every reception rather than deciding delivered/lost, so duplicate
/// deliveries show up here instead of being collapsed away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAudit {
    pub total_receptions: usize,
    /// Receptions beyond the first for the same (block, send, receiver)
    pub duplicate_receptions: usize,
    pub receptions_per_block: BTreeMap<u32, usize>,
    pub receptions_per_receiver: BTreeMap<String, usize>,
}

/// Terminal analysis failures
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Sender log not found: {path}")]
    MissingSenderLog { path: PathBuf },
}
