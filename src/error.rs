//! Error types for construction, configuration and export.
//!
//! The per-cycle simulation path never fails: full buffers drop packets and
//! empty buffers make pops a no-op.

use thiserror::Error;

/// Errors raised while building or configuring a simulation
#[derive(Error, Debug)]
pub enum NocError {
    #[error("Router buffer capacity must be positive")]
    ZeroCapacity,

    #[error("Injection probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("Snapshot interval must be positive")]
    InvalidSnapshotInterval,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
