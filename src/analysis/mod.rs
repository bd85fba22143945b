//! Event correlation and metrics for gossip experiment logs.
//!
//! This module reconstructs, for every block the sender transmitted, which
//! receivers actually received it and with what delay, and reduces the
//! reconstruction into loss and latency statistics.

pub mod types;
pub mod log_parser;
pub mod correlate;
pub mod metrics;
pub mod runner;
pub mod report;

pub use types::*;
pub use log_parser::{parse_all_logs, parse_log_file, parse_node_log};
pub use correlate::{correlate_all_receptions, correlate_nearest};
pub use metrics::{aggregate_metrics, build_delivery_audit};
pub use runner::{analyze_experiment, run_analysis, run_audit};
pub use report::{print_summary, write_artifact};
