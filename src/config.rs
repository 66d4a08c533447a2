//! Simulation configuration.
//!
//! Every field has a default, so a JSON config file only needs to name the
//! values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::NocError;
use crate::traffic::{
    DEFAULT_BASELINE_MAX_PACKETS, DEFAULT_HOTSPOT_FILL_TARGET, DEFAULT_INJECTION_PROBABILITY,
};
use crate::{Coord, DEFAULT_BUFFER_CAPACITY, DEFAULT_NOC_SIZE};

/// Configuration for a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Side length of the mesh
    pub grid_size: usize,
    /// Buffer capacity of every router
    pub buffer_capacity: usize,
    /// Per-router, per-cycle injection probability
    pub injection_probability: f64,
    /// Backlog each hotspot is pre-loaded to
    pub hotspot_fill_target: usize,
    /// Inclusive upper bound of each ordinary router's random backlog
    pub baseline_max_packets: usize,
    /// Seed of the simulation RNG
    pub seed: u64,
    /// Hotspot coordinates
    pub hotspots: Vec<Coord>,
    /// Number of cycles the driver runs
    pub cycles: usize,
    /// Cycles between recorded congestion snapshots
    pub snapshot_interval: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_NOC_SIZE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            injection_probability: DEFAULT_INJECTION_PROBABILITY,
            hotspot_fill_target: DEFAULT_HOTSPOT_FILL_TARGET,
            baseline_max_packets: DEFAULT_BASELINE_MAX_PACKETS,
            seed: 42,
            hotspots: Vec::new(),
            cycles: 100,
            snapshot_interval: 10,
        }
    }
}

impl SimConfig {
    /// The six-node hotspot layout used by the reference 8×8 run
    pub fn preset_hotspots() -> Vec<Coord> {
        vec![
            Coord::new(1, 2),
            Coord::new(2, 5),
            Coord::new(3, 4),
            Coord::new(5, 1),
            Coord::new(6, 7),
            Coord::new(7, 3),
        ]
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NocError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a JSON config document
    pub fn from_json_str(contents: &str) -> Result<Self, NocError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NocError> {
        if self.buffer_capacity == 0 {
            return Err(NocError::ZeroCapacity);
        }
        if !(0.0..=1.0).contains(&self.injection_probability) {
            return Err(NocError::InvalidProbability(self.injection_probability));
        }
        if self.snapshot_interval == 0 {
            return Err(NocError::InvalidSnapshotInterval);
        }
        Ok(())
    }
}
