//! # GossipSim - Loss and latency analysis for gossip dissemination experiments
//!
//! This library turns the raw per-node logs of a network-emulation gossip
//! experiment into delivery statistics. A distinguished sender (node 0)
//! transmits a numbered sequence of blocks; every node writes a free-form
//! text log. The logs carry no correlation identifiers, so the analysis
//! reconstructs which receiver got which transmission from block identity,
//! timestamps and address fields alone.
//!
//! ## Architecture
//!
//! - `config`: experiment setup descriptor (block count, addresses)
//! - `results`: discovery of numbered experiment folders under results/
//! - `analysis::log_parser`: regex extraction of send/receive events
//! - `analysis::correlate`: nearest-time delivery-path reconstruction,
//!   plus a duplicate-preserving variant for loss auditing
//! - `analysis::metrics`: overall, per-block and per-receiver statistics
//! - `analysis::runner`: orchestration of one experiment analysis
//! - `analysis::report`: the analysis.json artifact and console summaries
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gossipsim::{analysis, config, results};
//!
//! let setup = config::load_setup(std::path::Path::new("intent.json"))?;
//! let folder = results::latest_experiment(std::path::Path::new("results"))?;
//!
//! // Parses every node log, correlates sends to receptions, aggregates,
//! // and writes analysis.json into the experiment folder.
//! let report = analysis::analyze_experiment(&folder, &setup)?;
//! println!("loss: {:.2}%", report.overall.loss_percent);
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Only a missing sender log is fatal: without node 0 there is nothing to
//! correlate against. Everything else degrades gracefully and shows up in
//! the numbers instead (an unreadable receiver counts fully as loss, an
//! unparseable line is skipped). Public functions return
//! `color_eyre::Result` with typed domain errors underneath.

pub mod config;
pub mod results;
pub mod analysis;
