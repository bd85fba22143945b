//! Artifact serialization and console summaries.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};

use super::types::*;

/// Fixed artifact filename inside the experiment folder
pub const ARTIFACT_FILENAME: &str = "analysis.json";

/// Fixed audit filename inside the experiment folder
pub const AUDIT_FILENAME: &str = "delivery_audit.json";

/// Write the analysis artifact into the experiment folder.
pub fn write_artifact(report: &AnalysisReport, folder: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize analysis report to JSON")?;

    let output_path = folder.join(ARTIFACT_FILENAME);
    fs::write(&output_path, json)
        .with_context(|| format!("Failed to write artifact to {}", output_path.display()))?;

    log::info!("Analysis artifact written to {}", output_path.display());
    Ok(output_path)
}

/// Write the delivery audit next to the analysis artifact.
pub fn write_audit(audit: &DeliveryAudit, folder: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(audit)
        .context("Failed to serialize delivery audit to JSON")?;

    let output_path = folder.join(AUDIT_FILENAME);
    fs::write(&output_path, json)
        .with_context(|| format!("Failed to write audit to {}", output_path.display()))?;

    log::info!("Delivery audit written to {}", output_path.display());
    Ok(output_path)
}

/// Print a summary to stdout
pub fn print_summary(report: &AnalysisReport) {
    println!("\n=== GOSSIP DISSEMINATION ANALYSIS ===\n");
    println!("Experiment: {}", report.metadata.experiment_dir);
    println!(
        "Nodes: {} (1 sender, {} receivers)",
        report.metadata.node_count,
        report.metadata.node_count.saturating_sub(1)
    );
    println!("Blocks declared: {}", report.metadata.max_block);

    println!("\nOverall:");
    println!("  Sent: {}", report.overall.total_sent);
    println!("  Received: {}", report.overall.total_received);
    println!("  Loss: {:.2}%", report.overall.loss_percent);
    println!("  Average delay: {:.2}ms", report.overall.avg_delay_ms);

    if !report.per_receiver.is_empty() {
        println!("\nPer receiver:");
        for (addr, m) in &report.per_receiver {
            println!(
                "  {}: {}/{} received, loss {:.2}%, avg delay {:.2}ms",
                addr, m.received, m.sent, m.loss_percent, m.avg_delay_ms
            );
        }
    }

    println!();
}

/// Print a delivery audit summary to stdout
pub fn print_audit_summary(audit: &DeliveryAudit) {
    println!("\n=== DELIVERY AUDIT (duplicates preserved) ===\n");
    println!("Total receptions: {}", audit.total_receptions);
    println!("Duplicate receptions: {}", audit.duplicate_receptions);

    if !audit.receptions_per_block.is_empty() {
        println!("\nReceptions per block:");
        for (block_id, count) in &audit.receptions_per_block {
            println!("  block {}: {}", block_id, count);
        }
    }

    if !audit.receptions_per_receiver.is_empty() {
        println!("\nReceptions per receiver:");
        for (addr, count) in &audit.receptions_per_receiver {
            println!("  {}: {}", addr, count);
        }
    }

    println!();
}
