//! Export of run data for visualization.
//!
//! Drives a simulator cycle by cycle, captures congestion heatmaps at a
//! fixed interval and writes everything as one JSON document.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::NocError;
use crate::metrics::LbfHistory;
use crate::simulator::{NocSimulator, SimStats};
use crate::Coord;

/// Congestion heatmap captured after a given cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub congestion: Vec<Vec<f64>>,
}

/// Runs a simulator and keeps a snapshot every `interval` cycles
#[derive(Debug)]
pub struct SnapshotRecorder {
    interval: usize,
    snapshots: Vec<Snapshot>,
}

impl SnapshotRecorder {
    pub fn new(interval: usize) -> Result<Self, NocError> {
        if interval == 0 {
            return Err(NocError::InvalidSnapshotInterval);
        }
        Ok(Self {
            interval,
            snapshots: Vec::new(),
        })
    }

    /// Advance `sim` by `cycles`, snapshotting on every interval boundary
    pub fn run<R: Rng>(&mut self, sim: &mut NocSimulator<R>, cycles: usize) {
        for _ in 0..cycles {
            let stats = sim.step();
            if stats.cycle % self.interval as u64 == 0 {
                self.snapshots.push(Snapshot {
                    cycle: stats.cycle,
                    congestion: sim.congestion_matrix(),
                });
            }
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<Snapshot> {
        self.snapshots
    }
}

/// Everything a plotting front end needs from one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub grid_size: usize,
    pub buffer_capacity: usize,
    pub injection_probability: f64,
    pub seed: u64,
    pub hotspots: Vec<Coord>,
    pub lbf_history: LbfHistory,
    pub snapshots: Vec<Snapshot>,
    pub final_congestion: Vec<Vec<f64>>,
    pub stats: SimStats,
}

impl RunReport {
    pub fn new<R: Rng>(config: &SimConfig, sim: &NocSimulator<R>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            grid_size: sim.grid().size(),
            buffer_capacity: sim.grid().capacity(),
            injection_probability: sim.traffic().injection_probability(),
            seed: config.seed,
            hotspots: sim.traffic().hotspots().iter().collect(),
            lbf_history: sim.lbf_history().clone(),
            snapshots,
            final_congestion: sim.congestion_matrix(),
            stats: *sim.stats(),
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), NocError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self, NocError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
