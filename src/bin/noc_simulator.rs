//! NoC Simulator
//!
//! Builds a mesh, pre-loads hotspots and baseline traffic, runs the
//! adaptive-routing simulation and reports the Load Balance Factor.

use std::path::PathBuf;

use clap::Parser;
use noc_sim::export::{RunReport, SnapshotRecorder};
use noc_sim::{Coord, NocError, NocSimulator, SimConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "noc_simulator", about = "Congestion-aware NoC simulator")]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mesh side length
    #[arg(long, short = 'n')]
    size: Option<usize>,

    /// Router buffer capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Number of cycles to run
    #[arg(long, short = 'c')]
    cycles: Option<usize>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Per-router, per-cycle injection probability
    #[arg(long, short = 'p')]
    probability: Option<f64>,

    /// Hotspot coordinate as `x,y` (repeatable)
    #[arg(long = "hotspot", value_parser = parse_coord)]
    hotspots: Vec<Coord>,

    /// Use the six-node reference hotspot layout
    #[arg(long)]
    preset_hotspots: bool,

    /// Cycles between congestion snapshots
    #[arg(long)]
    snapshot_interval: Option<usize>,

    /// Write a JSON report to this path
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn parse_coord(s: &str) -> Result<Coord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok(Coord::new(x, y))
}

fn build_config(args: &Args) -> Result<SimConfig, NocError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };

    if let Some(size) = args.size {
        config.grid_size = size;
    }
    if let Some(capacity) = args.capacity {
        config.buffer_capacity = capacity;
    }
    if let Some(cycles) = args.cycles {
        config.cycles = cycles;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(probability) = args.probability {
        config.injection_probability = probability;
    }
    if let Some(interval) = args.snapshot_interval {
        config.snapshot_interval = interval;
    }
    if args.preset_hotspots {
        config.hotspots = SimConfig::preset_hotspots();
    }
    if !args.hotspots.is_empty() {
        config.hotspots = args.hotspots.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), NocError> {
    let config = build_config(&args)?;
    info!(
        size = config.grid_size,
        capacity = config.buffer_capacity,
        probability = config.injection_probability,
        hotspots = config.hotspots.len(),
        seed = config.seed,
        "Starting simulation"
    );

    let mut sim = NocSimulator::new(&config)?;
    if !config.hotspots.is_empty() {
        sim.seed_hotspots();
    }
    sim.seed_baseline();

    let mut recorder = SnapshotRecorder::new(config.snapshot_interval)?;
    recorder.run(&mut sim, config.cycles);

    let history = sim.lbf_history();
    println!("=== Simulation Results ===");
    println!("{}", sim.stats());
    println!("Final LBF:            {:.3}", history.last().unwrap_or(0.0));
    println!("Mean LBF:             {:.3}", history.mean().unwrap_or(0.0));
    println!("Peak LBF:             {:.3}", history.peak().unwrap_or(0.0));

    if let Some(path) = &args.output {
        let report = RunReport::new(&config, &sim, recorder.into_snapshots());
        report.write_json(path)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
