//! Experiment setup descriptor loading.
//!
//! The descriptor is produced by the orchestration that ran the experiment
//! and carries what the logs cannot: how many blocks the sender was going to
//! transmit, the sender's address, and (when known) the address of each
//! receiver node index.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use color_eyre::Result;
use log::info;
use serde::{Deserialize, Serialize};

/// Immutable description of one experiment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentSetup {
    /// Number of distinct blocks the sender transmits; block ids are 1-based
    pub max_block: u32,
    /// Address the sender's transmissions originate from
    pub sender_addr: String,
    /// Node index to address, for receivers whose address is known
    #[serde(default)]
    pub receiver_addrs: BTreeMap<u32, String>,
}

impl ExperimentSetup {
    /// Block ids run from 1 to max_block inclusive; anything else is noise.
    pub fn block_in_range(&self, block_id: u32) -> bool {
        block_id >= 1 && block_id <= self.max_block
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.max_block == 0 {
            return Err(SetupError::NoBlocks);
        }
        if self.sender_addr.is_empty() {
            return Err(SetupError::MissingSenderAddr);
        }
        Ok(())
    }
}

/// Setup descriptor validation errors
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Setup declares no blocks (max_block must be at least 1)")]
    NoBlocks,
    #[error("Setup has an empty sender address")]
    MissingSenderAddr,
}

/// Load and validate the setup descriptor from a JSON file
pub fn load_setup(path: &Path) -> Result<ExperimentSetup> {
    info!("Loading experiment setup from: {:?}", path);

    let file = File::open(path)?;
    let setup: ExperimentSetup = serde_json::from_reader(file)?;

    setup.validate()?;

    Ok(setup)
}
