//! Cycle-Synchronous NoC Simulator
//!
//! One cycle runs four phases in order:
//!
//! 1. **Injection**: every router may inject a new packet.
//! 2. **Decision**: routers are scanned in grid order. A head packet that
//!    has arrived is ejected on the spot; otherwise its next hop is chosen
//!    and recorded as a pending move. Decisions read the grid as it stands
//!    during the scan, so ejections earlier in the scan are visible.
//! 3. **Apply**: pending moves are applied strictly in decision order. A
//!    move pops the packet from its router and offers it to the target;
//!    a refused packet is re-queued at the tail of its original router.
//!    Earlier applies can fill or drain a later move's target, so target
//!    occupancy shifts during this phase.
//! 4. **Metrics**: the Load Balance Factor is appended to the history.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::SimConfig;
use crate::error::NocError;
use crate::grid::Grid;
use crate::metrics::{compute_lbf, LbfHistory};
use crate::router::Router;
use crate::routing;
use crate::traffic::{InjectionReport, TrafficGenerator};
use crate::{Coord, Packet, PacketId, PacketIds};

/// A hop decided in the decision phase, applied in the apply phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub from: Coord,
    pub packet: PacketId,
    pub to: Coord,
}

/// What happened during a single cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    pub cycle: u64,
    pub injected: usize,
    pub dropped: usize,
    pub delivered: usize,
    pub moved: usize,
    pub bounced: usize,
    pub lbf: f64,
}

/// Totals over the simulator's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub cycles: u64,
    pub preloaded: usize,
    pub injected: usize,
    pub dropped: usize,
    pub delivered: usize,
    pub moved: usize,
    pub bounced: usize,
}

impl SimStats {
    fn absorb(&mut self, cycle: &CycleStats) {
        self.cycles += 1;
        self.injected += cycle.injected;
        self.dropped += cycle.dropped;
        self.delivered += cycle.delivered;
        self.moved += cycle.moved;
        self.bounced += cycle.bounced;
    }
}

impl std::fmt::Display for SimStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cycles:               {}", self.cycles)?;
        writeln!(f, "Pre-loaded packets:   {}", self.preloaded)?;
        writeln!(f, "Injected packets:     {}", self.injected)?;
        writeln!(f, "Dropped on inject:    {}", self.dropped)?;
        writeln!(f, "Delivered packets:    {}", self.delivered)?;
        writeln!(f, "Hops taken:           {}", self.moved)?;
        write!(f, "Bounced moves:        {}", self.bounced)
    }
}

/// Owns the mesh and drives it cycle by cycle
pub struct NocSimulator<R = StdRng> {
    grid: Grid,
    traffic: TrafficGenerator,
    ids: PacketIds,
    rng: R,
    lbf_history: LbfHistory,
    stats: SimStats,
}

impl NocSimulator<StdRng> {
    /// Build a simulator whose RNG is seeded from `config.seed`
    pub fn new(config: &SimConfig) -> Result<Self, NocError> {
        Self::with_rng(config, StdRng::seed_from_u64(config.seed))
    }
}

impl<R: Rng> NocSimulator<R> {
    /// Build a simulator around a caller-supplied random source
    pub fn with_rng(config: &SimConfig, rng: R) -> Result<Self, NocError> {
        config.validate()?;
        let grid = Grid::new(config.grid_size, config.buffer_capacity)?;
        let mut traffic = TrafficGenerator::new(config.grid_size, config.injection_probability)?
            .with_preload(config.hotspot_fill_target, config.baseline_max_packets);
        traffic.set_hotspot_area(config.hotspots.iter().copied());

        Ok(Self {
            grid,
            traffic,
            ids: PacketIds::new(),
            rng,
            lbf_history: LbfHistory::new(),
            stats: SimStats::default(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct access to router buffers, for drivers and tests that stage
    /// traffic by hand
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn lbf_history(&self) -> &LbfHistory {
        &self.lbf_history
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn traffic(&self) -> &TrafficGenerator {
        &self.traffic
    }

    /// Replace the hotspot set; buffered packets are not touched
    pub fn set_hotspot_area<I>(&mut self, coords: I)
    where
        I: IntoIterator<Item = Coord>,
    {
        self.traffic.set_hotspot_area(coords);
    }

    pub fn is_hotspot(&self, coord: Coord) -> bool {
        self.traffic.is_hotspot(coord)
    }

    /// Congestion of a single router; 0.0 outside the mesh
    pub fn congestion(&self, coord: Coord) -> f64 {
        self.grid.congestion_at(coord)
    }

    pub fn has_packet(&self, coord: Coord) -> bool {
        self.grid.router(coord).is_some_and(Router::has_packet)
    }

    pub fn congestion_matrix(&self) -> Vec<Vec<f64>> {
        self.grid.congestion_matrix()
    }

    pub fn compute_lbf(&self) -> f64 {
        compute_lbf(&self.grid)
    }

    /// Queue a packet at `source` by hand. Returns its id, or `None` if the
    /// source is outside the mesh or its buffer is full.
    pub fn inject_packet(&mut self, source: Coord, destination: Coord) -> Option<PacketId> {
        let router = self.grid.router_mut(source)?;
        let packet = Packet::new(self.ids.next_id(), source, destination);
        let id = packet.id;
        router.try_add(packet).ok().map(|()| id)
    }

    /// Pre-load every hotspot with its fill target
    pub fn seed_hotspots(&mut self) -> usize {
        let added = self
            .traffic
            .seed_hotspots(&mut self.grid, &mut self.ids, &mut self.rng);
        self.stats.preloaded += added;
        info!(
            hotspots = self.traffic.hotspots().len(),
            packets = added,
            "Hotspots pre-loaded"
        );
        added
    }

    /// Pre-load every non-hotspot router with a random baseline backlog
    pub fn seed_baseline(&mut self) -> usize {
        let added = self
            .traffic
            .seed_baseline(&mut self.grid, &mut self.ids, &mut self.rng);
        self.stats.preloaded += added;
        info!(packets = added, "Baseline load pre-loaded");
        added
    }

    /// Run the injection phase on its own
    pub fn generate_traffic(&mut self) -> InjectionReport {
        self.traffic
            .inject(&mut self.grid, &mut self.ids, &mut self.rng)
    }

    /// Run one full cycle
    pub fn step(&mut self) -> CycleStats {
        let mut cycle = CycleStats {
            cycle: self.stats.cycles + 1,
            ..CycleStats::default()
        };

        let injection = self.generate_traffic();
        cycle.injected = injection.injected;
        cycle.dropped = injection.dropped;

        let moves = self.decide(&mut cycle);
        self.apply(&moves, &mut cycle);

        cycle.lbf = compute_lbf(&self.grid);
        self.lbf_history.record(cycle.lbf);
        self.stats.absorb(&cycle);

        trace!(
            cycle = cycle.cycle,
            injected = cycle.injected,
            dropped = cycle.dropped,
            delivered = cycle.delivered,
            moved = cycle.moved,
            bounced = cycle.bounced,
            lbf = cycle.lbf,
            "Cycle complete"
        );
        cycle
    }

    /// Run `cycles` full cycles to completion
    pub fn run_simulation(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.step();
        }
        debug!(
            cycles,
            total_cycles = self.stats.cycles,
            lbf = self.lbf_history.last().unwrap_or(0.0),
            "Simulation advanced"
        );
    }

    /// Decision phase: eject arrived heads, route the rest
    fn decide(&mut self, cycle: &mut CycleStats) -> Vec<PendingMove> {
        let mut moves = Vec::new();

        for at in self.grid.coords().collect::<Vec<_>>() {
            let head = self
                .grid
                .router(at)
                .and_then(Router::front)
                .map(|p| (p.id, p.destination));
            let Some((packet, destination)) = head else {
                continue;
            };

            if destination == at {
                if let Some(router) = self.grid.router_mut(at) {
                    router.pop_front();
                }
                cycle.delivered += 1;
                continue;
            }

            if let Some(to) = routing::next_hop(&self.grid, at, destination) {
                moves.push(PendingMove {
                    from: at,
                    packet,
                    to,
                });
            }
        }

        moves
    }

    /// Apply phase: execute moves in decision order
    fn apply(&mut self, moves: &[PendingMove], cycle: &mut CycleStats) {
        for mv in moves {
            let Some(packet) = self.grid.router_mut(mv.from).and_then(Router::pop_front) else {
                continue;
            };
            debug_assert_eq!(packet.id, mv.packet);

            let offered = match self.grid.router_mut(mv.to) {
                Some(target) => target.try_add(packet),
                None => Err(packet),
            };
            let Err(refused) = offered else {
                cycle.moved += 1;
                continue;
            };

            cycle.bounced += 1;
            debug!(packet = %refused.id, from = %mv.from, to = %mv.to, "Target full, packet re-queued");
            let requeued = match self.grid.router_mut(mv.from) {
                Some(origin) => origin.try_add(refused),
                None => Err(refused),
            };
            if let Err(lost) = requeued {
                warn!(packet = %lost.id, at = %mv.from, "Re-queue failed, packet lost");
            }
        }
    }
}
