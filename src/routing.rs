//! Congestion-Aware Adaptive Routing
//!
//! Minimal adaptive routing on the mesh: a packet may step one hop along
//! the x axis or one hop along the y axis towards its destination, and takes
//! whichever productive neighbor is currently least congested.

use crate::grid::Grid;
use crate::Coord;

/// Step one unit from `from` towards `to` along a single axis
fn step_towards(from: usize, to: usize) -> Option<usize> {
    use std::cmp::Ordering;
    match from.cmp(&to) {
        Ordering::Less => from.checked_add(1),
        Ordering::Greater => from.checked_sub(1),
        Ordering::Equal => None,
    }
}

/// Productive neighbors of `current` towards `destination`, x-axis first.
/// Neighbors outside the mesh are omitted.
pub fn candidates(grid: &Grid, current: Coord, destination: Coord) -> Vec<Coord> {
    let mut candidates = Vec::with_capacity(2);

    if let Some(x) = step_towards(current.x, destination.x) {
        let next = Coord::new(x, current.y);
        if grid.contains(next) {
            candidates.push(next);
        }
    }
    if let Some(y) = step_towards(current.y, destination.y) {
        let next = Coord::new(current.x, y);
        if grid.contains(next) {
            candidates.push(next);
        }
    }

    candidates
}

/// Choose the next hop for a packet at `current` bound for `destination`.
///
/// Returns `None` when there is no productive in-mesh neighbor, including
/// when the packet is already at its destination. Ties go to the x-axis
/// candidate.
pub fn next_hop(grid: &Grid, current: Coord, destination: Coord) -> Option<Coord> {
    let mut best: Option<(Coord, f64)> = None;

    for candidate in candidates(grid, current, destination) {
        let congestion = grid.congestion_at(candidate);
        match best {
            Some((_, best_congestion)) if congestion >= best_congestion => {}
            _ => best = Some((candidate, congestion)),
        }
    }

    best.map(|(coord, _)| coord)
}
