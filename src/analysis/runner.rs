//! Orchestration of a full experiment analysis.
//!
//! Locates the node logs inside one experiment folder, parses them, runs
//! correlation and aggregation, and assembles the output artifact. The
//! folder to analyze is always passed in by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};

use super::correlate::{correlate_all_receptions, correlate_nearest};
use super::log_parser::parse_all_logs;
use super::metrics::{aggregate_metrics, build_delivery_audit};
use super::report::write_artifact;
use super::types::*;
use crate::config::ExperimentSetup;

/// Sender log filename; node 0 is the sender by convention.
pub const SENDER_LOG: &str = "0.txt";

/// Find the per-node log files in an experiment folder.
///
/// Node logs are `<index>.txt`; anything else in the folder is ignored.
pub fn discover_node_logs(folder: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read experiment folder {}", folder.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "txt") {
            if let Some(index) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u32>().ok())
            {
                files.push((index, path));
            }
        }
    }

    files.sort_by_key(|(index, _)| *index);
    Ok(files)
}

/// Parse the experiment folder into the sender log and the receiver logs.
///
/// The sender log must exist; everything after that degrades gracefully.
fn load_experiment(folder: &Path, setup: &ExperimentSetup) -> Result<(NodeLog, Vec<NodeLog>)> {
    let sender_path = folder.join(SENDER_LOG);
    if !sender_path.is_file() {
        return Err(AnalysisError::MissingSenderLog { path: sender_path }.into());
    }

    let files = discover_node_logs(folder)?;
    let mut logs = parse_all_logs(&files, setup);

    let sender_pos = logs
        .iter()
        .position(|l| l.node_index == 0)
        .ok_or(AnalysisError::MissingSenderLog { path: sender_path })?;
    let sender = logs.remove(sender_pos);

    Ok((sender, logs))
}

/// Run the full pipeline for one experiment folder and return the report.
pub fn run_analysis(folder: &Path, setup: &ExperimentSetup) -> Result<AnalysisReport> {
    let (sender, receivers) = load_experiment(folder, setup)?;

    let paths = correlate_nearest(&sender, &receivers, setup);
    let metrics = aggregate_metrics(&sender, &receivers, &paths, setup);

    Ok(assemble_report(folder, setup, sender, receivers, &metrics))
}

/// Run the full pipeline and write analysis.json into the experiment folder.
pub fn analyze_experiment(folder: &Path, setup: &ExperimentSetup) -> Result<AnalysisReport> {
    let report = run_analysis(folder, setup)?;
    write_artifact(&report, folder)?;
    Ok(report)
}

/// Run the duplicate-preserving correlation and summarize it for auditing.
pub fn run_audit(folder: &Path, setup: &ExperimentSetup) -> Result<DeliveryAudit> {
    let (sender, receivers) = load_experiment(folder, setup)?;

    let paths = correlate_all_receptions(&sender, &receivers, setup);
    Ok(build_delivery_audit(&paths))
}

fn assemble_report(
    folder: &Path,
    setup: &ExperimentSetup,
    sender: NodeLog,
    receivers: Vec<NodeLog>,
    metrics: &AggregatedMetrics,
) -> AnalysisReport {
    let mut nodes = Vec::with_capacity(receivers.len() + 1);
    nodes.push(sender);
    nodes.extend(receivers);

    let metadata = AnalysisMetadata {
        analysis_timestamp: chrono::Utc::now().to_rfc3339(),
        experiment_dir: folder.display().to_string(),
        max_block: setup.max_block,
        node_count: nodes.len(),
        total_send_events: nodes.iter().map(|n| n.send_events.len()).sum(),
        total_receive_events: nodes.iter().map(|n| n.receive_events.len()).sum(),
    };

    let overall = OverallMetrics {
        total_sent: metrics.overall.sent_count,
        total_received: metrics.overall.received_count,
        loss_percent: metrics.overall.loss_percent,
        avg_delay_ms: metrics.overall.avg_delay_ms,
    };

    let per_block = metrics
        .per_block
        .iter()
        .map(|(block_id, bucket)| {
            (
                *block_id,
                BlockMetrics {
                    loss_percent: bucket.loss_percent,
                    avg_delay_ms: bucket.avg_delay_ms,
                    avg_reported_delay_ms: metrics
                        .reported_delay_per_block
                        .get(block_id)
                        .copied()
                        .unwrap_or(0.0),
                },
            )
        })
        .collect();

    let per_receiver = metrics
        .per_receiver
        .iter()
        .map(|(label, bucket)| {
            (
                label.clone(),
                ReceiverMetrics {
                    sent: bucket.sent_count,
                    received: bucket.received_count,
                    loss_percent: bucket.loss_percent,
                    avg_delay_ms: bucket.avg_delay_ms,
                },
            )
        })
        .collect();

    AnalysisReport {
        metadata,
        nodes,
        overall,
        per_block,
        per_receiver,
    }
}
