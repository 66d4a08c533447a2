//! NoC-Sim: Congestion-Aware Network-on-Chip Simulator
//!
//! Core library for a cycle-synchronous mesh of bounded-buffer routers,
//! local-congestion adaptive routing and Load Balance Factor tracking.

pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod hotspot;
pub mod metrics;
pub mod router;
pub mod routing;
pub mod simulator;
pub mod traffic;

pub use config::SimConfig;
pub use error::NocError;
pub use grid::Grid;
pub use hotspot::HotspotSet;
pub use router::Router;
pub use simulator::NocSimulator;

use serde::{Deserialize, Serialize};

/// Default side length of the router mesh
pub const DEFAULT_NOC_SIZE: usize = 8;

/// Default number of packets a router buffer can hold
pub const DEFAULT_BUFFER_CAPACITY: usize = 10;

/// A router position in the mesh. `x` is the row index, `y` the column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate
    pub fn manhattan(&self, other: &Coord) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unique packet identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PacketId(pub u64);

impl std::fmt::Display for PacketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single-flit packet travelling through the mesh.
///
/// Packets are immutable once created and are moved (never cloned) between
/// router buffers.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub id: PacketId,
    pub source: Coord,
    pub destination: Coord,
}

impl Packet {
    pub fn new(id: PacketId, source: Coord, destination: Coord) -> Self {
        Self {
            id,
            source,
            destination,
        }
    }
}

/// Monotonic source of packet identities for one simulation lifetime.
#[derive(Debug, Default)]
pub struct PacketIds {
    next: u64,
}

impl PacketIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identity
    pub fn next_id(&mut self) -> PacketId {
        let id = PacketId(self.next);
        self.next += 1;
        id
    }

    /// Number of identities handed out so far
    pub fn issued(&self) -> u64 {
        self.next
    }
}
