#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless capture zone session.

mod autopilot;
mod session;

use std::{cell::RefCell, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use capture_zones_core::{ReplacementMode, TileGrid, ZoneConfig};
use capture_zones_engine::{config, ZoneEngine};
use clap::{Parser, ValueEnum};
use glam::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    autopilot::Autopilot,
    session::{Tally, Wallet},
};

/// Runs capture zones against a scripted player and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "capture-zones", version)]
struct Args {
    /// TOML file holding zone profiles and tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Board width in tiles.
    #[arg(long, default_value_t = 32)]
    columns: u32,
    /// Board height in tiles.
    #[arg(long, default_value_t = 24)]
    rows: u32,
    /// Side length of a tile in world units.
    #[arg(long, default_value_t = 1.0)]
    tile_length: f32,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 1200)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Overrides the placement seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the replacement mode from the configuration.
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Autopilot speed in tiles per second.
    #[arg(long, default_value_t = 6.0)]
    speed: f32,
    /// Enables debug logging unless RUST_LOG is set.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Batch,
    Independent,
}

impl From<Mode> for ReplacementMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Batch => Self::Batch,
            Mode::Independent => Self::Independent,
        }
    }
}

/// Entry point for the capture zones command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut zone_config = match &args.config {
        Some(path) => config::load(path)?,
        None => ZoneConfig::default(),
    };
    if let Some(seed) = args.seed {
        zone_config.tunables.rng_seed = seed;
    }
    if let Some(mode) = args.mode {
        zone_config.tunables.replacement_mode = mode.into();
    }

    let grid = TileGrid::new(args.columns, args.rows, args.tile_length);
    let mut engine =
        ZoneEngine::with_board(zone_config, grid).context("invalid zone configuration")?;

    let tally = Rc::new(RefCell::new(Tally::default()));
    let recorder = Rc::clone(&tally);
    let _ = engine.subscribe(move |event| recorder.borrow_mut().record(event));

    let dt = Duration::from_millis(args.tick_ms);
    let start = grid.origin() + Vec2::new(grid.width(), grid.height()) * 0.5;
    let mut pilot = Autopilot::new(start, args.speed * args.tile_length);
    let mut wallet = Wallet::default();

    info!(
        ticks = args.ticks,
        tick_ms = args.tick_ms,
        mode = ?engine.config().tunables.replacement_mode,
        "session started"
    );
    for _ in 0..args.ticks {
        pilot.steer(&engine.zones());
        let _ = engine.tick(dt, Some(&mut pilot), &mut wallet);
        pilot.advance(dt, &grid);
    }

    let tally = *tally.borrow();
    println!("simulated:          {:.1}s", engine.clock().as_secs_f32());
    println!("zones spawned:      {}", tally.spawned);
    println!("zones consumed:     {}", tally.consumed);
    println!("zones expired:      {}", tally.expired);
    println!(
        "bounces:            {} ({} in bonus sector)",
        tally.bounces, tally.bonus_hits
    );
    println!("roster resets:      {}", tally.roster_resets);
    println!("reward:             {} over {} grants", wallet.total, wallet.grants);
    if let Some(contamination) = engine.contamination() {
        println!(
            "contaminated tiles: {} ({:.1}% clean)",
            contamination.contaminated_count(),
            contamination.clean_fraction() * 100.0
        );
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
