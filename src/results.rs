//! Experiment results folder discovery.
//!
//! Experiment runs land in numeric subdirectories of the results directory,
//! one per run; the highest number is the most recent. The chosen folder is
//! passed explicitly into the analysis, so nothing here keeps state.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Context, Result};

/// Path of experiment number `number` under the results directory.
pub fn experiment_dir(results_dir: &Path, number: u32) -> PathBuf {
    results_dir.join(number.to_string())
}

/// Find the most recent experiment folder (highest numeric subdirectory).
pub fn latest_experiment(results_dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(results_dir)
        .with_context(|| format!("Failed to read results directory {}", results_dir.display()))?;

    let mut latest: Option<u32> = None;
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(number) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<u32>().ok())
        {
            latest = Some(latest.map_or(number, |n| n.max(number)));
        }
    }

    match latest {
        Some(number) => Ok(experiment_dir(results_dir, number)),
        None => Err(eyre!(
            "No experiment folders found in {}",
            results_dir.display()
        )),
    }
}
