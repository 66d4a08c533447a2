//! Hotspot designation.
//!
//! Hotspots never receive generated traffic as a destination but may hold a
//! pre-loaded backlog.

use std::collections::BTreeSet;

use crate::Coord;

/// Set of hotspot coordinates, replaced as a whole
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotspotSet {
    coords: BTreeSet<Coord>,
}

impl HotspotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set. Coordinates outside any mesh are kept but
    /// never match a router.
    pub fn replace<I>(&mut self, coords: I)
    where
        I: IntoIterator<Item = Coord>,
    {
        self.coords = coords.into_iter().collect();
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.coords.contains(&coord)
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Hotspots in ascending coordinate order
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.coords.iter().copied()
    }

    /// All coordinates of a `size`×`size` mesh that are not hotspots, in
    /// scan order
    pub fn eligible_destinations(&self, size: usize) -> Vec<Coord> {
        let mut eligible = Vec::with_capacity(size * size);
        for x in 0..size {
            for y in 0..size {
                let coord = Coord::new(x, y);
                if !self.contains(coord) {
                    eligible.push(coord);
                }
            }
        }
        eligible
    }
}

impl FromIterator<Coord> for HotspotSet {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        Self {
            coords: iter.into_iter().collect(),
        }
    }
}
