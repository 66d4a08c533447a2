//! N×N mesh of routers.
//!
//! `routers[x][y]` always holds the router whose own coordinate is `(x, y)`.

use crate::error::NocError;
use crate::router::Router;
use crate::Coord;

/// Square mesh owning every router
#[derive(Debug)]
pub struct Grid {
    size: usize,
    capacity: usize,
    routers: Vec<Vec<Router>>,
}

impl Grid {
    /// Build a `size`×`size` mesh with uniform buffer capacity.
    /// A zero-sized mesh is valid; a zero capacity is not.
    pub fn new(size: usize, capacity: usize) -> Result<Self, NocError> {
        if capacity == 0 {
            return Err(NocError::ZeroCapacity);
        }

        let mut routers = Vec::with_capacity(size);
        for x in 0..size {
            let mut row = Vec::with_capacity(size);
            for y in 0..size {
                row.push(Router::new(Coord::new(x, y), capacity)?);
            }
            routers.push(row);
        }

        Ok(Self {
            size,
            capacity,
            routers,
        })
    }

    /// Side length
    pub fn size(&self) -> usize {
        self.size
    }

    /// Per-router buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of routers (N²)
    pub fn router_count(&self) -> usize {
        self.size * self.size
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.size && coord.y < self.size
    }

    pub fn router(&self, coord: Coord) -> Option<&Router> {
        self.routers.get(coord.x).and_then(|row| row.get(coord.y))
    }

    pub fn router_mut(&mut self, coord: Coord) -> Option<&mut Router> {
        self.routers.get_mut(coord.x).and_then(|row| row.get_mut(coord.y))
    }

    /// Every coordinate in scan order (x outer, y inner)
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let size = self.size;
        (0..size).flat_map(move |x| (0..size).map(move |y| Coord::new(x, y)))
    }

    /// Every router in scan order
    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.routers.iter().flatten()
    }

    /// Congestion of a router; 0.0 for coordinates outside the mesh
    pub fn congestion_at(&self, coord: Coord) -> f64 {
        self.router(coord).map(Router::congestion).unwrap_or(0.0)
    }

    /// Snapshot of every router's congestion, indexed `[x][y]`
    pub fn congestion_matrix(&self) -> Vec<Vec<f64>> {
        self.routers
            .iter()
            .map(|row| row.iter().map(Router::congestion).collect())
            .collect()
    }

    /// Snapshot of every router's buffer length, indexed `[x][y]`
    pub fn occupancy_matrix(&self) -> Vec<Vec<usize>> {
        self.routers
            .iter()
            .map(|row| row.iter().map(Router::len).collect())
            .collect()
    }

    /// Packets buffered across the whole mesh
    pub fn total_packets(&self) -> usize {
        self.routers().map(Router::len).sum()
    }
}
