//! Analysis CLI for gossip dissemination experiments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use env_logger::Env;
use log::info;

use gossipsim::analysis::{self, report};
use gossipsim::{config, results};

/// Loss and latency analysis for gossip dissemination experiments
#[derive(Parser)]
#[command(name = "gossip-analyzer")]
#[command(about = "Loss and latency analysis for gossip dissemination experiments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the results directory containing numbered experiment folders
    #[arg(short, long, default_value = "results")]
    results_dir: PathBuf,

    /// Path to the experiment setup descriptor JSON
    #[arg(short, long, default_value = "intent.json")]
    setup: PathBuf,

    /// Experiment number to analyze (defaults to the latest)
    #[arg(short, long)]
    experiment: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write analysis.json into the experiment folder
    Analyze {
        /// Omit the per-node event lists from the artifact
        #[arg(long)]
        no_events: bool,
    },

    /// Duplicate-preserving delivery audit (counts every reception)
    Audit,

    /// Parse the logs and print event counts without writing anything
    Summary,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let setup = config::load_setup(&cli.setup)?;

    let folder = match cli.experiment {
        Some(number) => results::experiment_dir(&cli.results_dir, number),
        None => results::latest_experiment(&cli.results_dir)?,
    };
    info!("Analyzing experiment folder {}", folder.display());

    match cli.command {
        Commands::Analyze { no_events } => {
            let mut analysis_report = analysis::run_analysis(&folder, &setup)?;
            if no_events {
                analysis_report.nodes.clear();
            }
            report::write_artifact(&analysis_report, &folder)?;
            report::print_summary(&analysis_report);
        }
        Commands::Audit => {
            let audit = analysis::run_audit(&folder, &setup)?;
            report::write_audit(&audit, &folder)?;
            report::print_audit_summary(&audit);
        }
        Commands::Summary => {
            let files = analysis::runner::discover_node_logs(&folder)?;
            let logs = analysis::parse_all_logs(&files, &setup);

            println!("\n=== GOSSIP EXPERIMENT SUMMARY ===\n");
            println!("Experiment folder: {}", folder.display());
            println!("Node logs: {}", logs.len());
            for node in &logs {
                println!(
                    "  {} ({}): {} send events, {} receive events",
                    node.node_index,
                    node.label(),
                    node.send_events.len(),
                    node.receive_events.len()
                );
            }
            println!();
        }
    }

    Ok(())
}
