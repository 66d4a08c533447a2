//! Load Balance Factor
//!
//! LBF = max congestion / max(mean congestion, EPSILON). A value of 1.0
//! means every router is equally loaded; N² means one full router carries
//! all of the load.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Floor on the mean congestion to avoid dividing by zero
pub const EPSILON: f64 = 1e-6;

/// Compute the Load Balance Factor of the current grid state.
/// An empty mesh has an LBF of 0.
pub fn compute_lbf(grid: &Grid) -> f64 {
    let count = grid.router_count();
    if count == 0 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut max: f64 = 0.0;
    for router in grid.routers() {
        let c = router.congestion();
        sum += c;
        max = max.max(c);
    }

    let mean = sum / count as f64;
    max / mean.max(EPSILON)
}

/// Append-only, one value per completed cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LbfHistory(Vec<f64>);

impl LbfHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, lbf: f64) {
        self.0.push(lbf);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// Mean LBF over the recorded cycles
    pub fn mean(&self) -> Option<f64> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.iter().sum::<f64>() / self.0.len() as f64)
        }
    }

    /// Worst (largest) LBF recorded
    pub fn peak(&self) -> Option<f64> {
        self.0.iter().copied().reduce(f64::max)
    }
}
