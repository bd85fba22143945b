//! Log parsing for gossip workload node logs.
//!
//! Extracts send and receive events from per-node text logs using three
//! independent line patterns and parallel per-file processing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use color_eyre::eyre::{Context, Result};
use rayon::prelude::*;
use regex::Regex;

use super::types::*;
use crate::config::ExperimentSetup;

/// Compiled regex patterns for log parsing
pub struct LogPatterns {
    /// Match: "[time : N]" anywhere in the line
    pub time_tag: Regex,
    /// Match: "Send block data N to IP"
    pub send_notice: Regex,
    /// Match: "block_N is received ... from IP, transmission delay: N ms ... (length: N"
    pub receive_notice: Regex,
}

impl LogPatterns {
    pub fn new() -> Self {
        Self {
            time_tag: Regex::new(r"\[time\s*:\s*(\d+)\]").expect("Invalid time_tag regex"),
            send_notice: Regex::new(r"Send block data (\d+) to ([0-9.]+)")
                .expect("Invalid send_notice regex"),
            receive_notice: Regex::new(
                r"block_(\d+) is received.*from ([0-9.]+), transmission delay: (\d+) ms.*\(length:\s*(\d+)",
            )
            .expect("Invalid receive_notice regex"),
        }
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<LogPatterns> = LazyLock::new(LogPatterns::new);

/// Extract the embedded timestamp tag from a line, if any.
pub fn extract_timestamp(line: &str) -> Option<LogTime> {
    let caps = PATTERNS.time_tag.captures(line)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Extract a send notice (block id, target address) from a line, if any.
pub fn extract_send(line: &str) -> Option<(u32, String)> {
    let caps = PATTERNS.send_notice.captures(line)?;
    let block_id = caps.get(1)?.as_str().parse().ok()?;
    let target_addr = caps.get(2)?.as_str().to_string();
    Some((block_id, target_addr))
}

/// Extract a receive notice (block id, source address, reported delay in ms,
/// payload length in bytes) from a line, if any.
pub fn extract_receive(line: &str) -> Option<(u32, String, u64, u64)> {
    let caps = PATTERNS.receive_notice.captures(line)?;
    let block_id = caps.get(1)?.as_str().parse().ok()?;
    let source_addr = caps.get(2)?.as_str().to_string();
    let reported_delay_ms = caps.get(3)?.as_str().parse().ok()?;
    let payload_len = caps.get(4)?.as_str().parse().ok()?;
    Some((block_id, source_addr, reported_delay_ms, payload_len))
}

/// Run all extractors against one line and append whatever events it yields.
///
/// The patterns are checked independently, so a single line may produce a
/// send event, a receive event, both, or nothing. The timestamp tag applies
/// to the event(s) from the same line; without one the events carry no
/// timestamp and are later skipped by correlation.
fn parse_line(line: &str, data: &mut NodeLog) {
    let timestamp = extract_timestamp(line);

    if let Some((block_id, target_addr)) = extract_send(line) {
        data.send_events.push(SendEvent {
            block_id,
            timestamp,
            target_addr,
        });
    }

    if let Some((block_id, source_addr, reported_delay_ms, payload_len)) = extract_receive(line) {
        data.receive_events.push(ReceiveEvent {
            block_id,
            timestamp,
            source_addr,
            reported_delay_ms,
            payload_len,
        });
    }
}

/// Parse raw log text for one node.
pub fn parse_node_log(text: &str, node_index: u32, node_addr: Option<String>) -> NodeLog {
    let mut data = NodeLog::new(node_index, node_addr);
    for line in text.lines() {
        parse_line(line, &mut data);
    }
    data
}

/// Parse a single node log file.
///
/// Unrecognized lines are skipped; only failing to open the file is an error.
pub fn parse_log_file(path: &Path, node_index: u32, node_addr: Option<String>) -> Result<NodeLog> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;
    let reader = BufReader::with_capacity(64 * 1024, file);

    let mut data = NodeLog::new(node_index, node_addr);
    for line_result in reader.lines() {
        let line = match line_result {
            Ok(l) => l,
            // Skip non-UTF-8 lines; the stream has already advanced past them
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => continue,
            // Any other read failure is persistent; keep what we have
            Err(_) => break,
        };
        parse_line(&line, &mut data);
    }

    Ok(data)
}

/// Address for a node index per the setup descriptor. Index 0 is the sender.
pub fn node_addr_for(node_index: u32, setup: &ExperimentSetup) -> Option<String> {
    if node_index == 0 {
        Some(setup.sender_addr.clone())
    } else {
        setup.receiver_addrs.get(&node_index).cloned()
    }
}

/// Parse all node log files in parallel.
///
/// An unreadable file degrades to an empty log for that node so it still
/// appears in the per-receiver tables, with every expected delivery counted
/// as loss. The result is ordered by node index regardless of scheduling.
pub fn parse_all_logs(files: &[(u32, PathBuf)], setup: &ExperimentSetup) -> Vec<NodeLog> {
    log::info!("Parsing {} node logs in parallel...", files.len());

    let mut logs: Vec<NodeLog> = files
        .par_iter()
        .map(|(node_index, path)| {
            let node_addr = node_addr_for(*node_index, setup);
            match parse_log_file(path, *node_index, node_addr.clone()) {
                Ok(data) => {
                    log::debug!(
                        "Parsed {}: {} send events, {} receive events",
                        path.display(),
                        data.send_events.len(),
                        data.receive_events.len()
                    );
                    data
                }
                Err(e) => {
                    log::warn!(
                        "Failed to read {}: {}; node contributes no events",
                        path.display(),
                        e
                    );
                    NodeLog::new(*node_index, node_addr)
                }
            }
        })
        .collect();

    logs.sort_by_key(|l| l.node_index);

    let total_sends: usize = logs.iter().map(|l| l.send_events.len()).sum();
    let total_receives: usize = logs.iter().map(|l| l.receive_events.len()).sum();
    log::info!(
        "Parsed {} nodes, {} send events, {} receive events",
        logs.len(),
        total_sends,
        total_receives
    );

    logs
}
