//! Mesh Router
//!
//! A router is a single bounded FIFO of packets pinned to a grid position.

use std::collections::VecDeque;

use crate::error::NocError;
use crate::{Coord, Packet};

/// A router with a bounded packet buffer
#[derive(Debug)]
pub struct Router {
    coord: Coord,
    capacity: usize,
    buffer: VecDeque<Packet>,
}

impl Router {
    /// Create an empty router. A zero capacity is rejected.
    pub fn new(coord: Coord, capacity: usize) -> Result<Self, NocError> {
        if capacity == 0 {
            return Err(NocError::ZeroCapacity);
        }
        Ok(Self {
            coord,
            capacity,
            buffer: VecDeque::with_capacity(capacity),
        })
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of packets currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    /// Occupancy ratio in [0, 1]
    pub fn congestion(&self) -> f64 {
        self.buffer.len() as f64 / self.capacity as f64
    }

    pub fn has_packet(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Head-of-line packet
    pub fn front(&self) -> Option<&Packet> {
        self.buffer.front()
    }

    /// Buffered packets in arrival order
    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.buffer.iter()
    }

    /// Append a packet at the tail.
    ///
    /// When the buffer is full the packet is handed back untouched and the
    /// buffer is left unchanged.
    pub fn try_add(&mut self, packet: Packet) -> Result<(), Packet> {
        if self.is_full() {
            return Err(packet);
        }
        self.buffer.push_back(packet);
        Ok(())
    }

    /// Remove the head packet, if any
    pub fn pop_front(&mut self) -> Option<Packet> {
        self.buffer.pop_front()
    }
}
