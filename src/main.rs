//! Headless driver for the team member cloud.
//!
//! Runs the same `CloudCore` the page uses without a browser and prints JSON
//! to stdout. Logs go to stderr.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cloud::config::{CloudConfig, ConfigError};
use cloud::consts::NOMINAL_FRAME_MS;
use cloud::engine::{Action, CloudCore, CloudSnapshot};
use cloud::geom::{Point, Rect};
use cloud::input::PointerSample;
use cloud::member::{MemberId, MemberStyle, Ring, Spring};
use cloud::orbit::{SpringParams, spring_step};
use cloud::placement::{Placement, place_outer};
use cloud::roster::Roster;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "teamcloud", about = "Headless driver for the team member cloud")]
struct Cli {
    /// JSON config file. Missing fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for placement and shuffles. Random when omitted.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place the outer ring and print every placement.
    Place(PlaceArgs),
    /// Run the cloud for a number of frames and print its final state.
    Simulate(SimulateArgs),
    /// Release a spring at an offset from a fixed target and report how it settles.
    Settle(SettleArgs),
    /// Print the proximity styles produced by one cursor position.
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
struct PlaceArgs {
    /// Members to place. Defaults to the configured outer count.
    #[arg(long)]
    count: Option<usize>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Wall time per frame.
    #[arg(long, default_value_t = NOMINAL_FRAME_MS)]
    frame_ms: f64,
}

#[derive(Args, Debug)]
struct SettleArgs {
    #[arg(long, default_value_t = 100.0, allow_hyphen_values = true)]
    dx: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    dy: f64,

    #[arg(long, default_value_t = 1000)]
    max_steps: u32,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Cursor x relative to the cloud center.
    #[arg(long, allow_hyphen_values = true)]
    x: f64,

    /// Cursor y relative to the cloud center.
    #[arg(long, allow_hyphen_values = true)]
    y: f64,

    /// Frames to run before probing, so the outer ring has spawned.
    #[arg(long, default_value_t = 30)]
    frames: u32,
}

#[derive(Debug, Serialize)]
struct SimulateReport {
    frames: u32,
    actions: BTreeMap<&'static str, usize>,
    snapshot: CloudSnapshot,
}

#[derive(Debug, Serialize)]
struct SettleReport {
    steps: u32,
    settled: bool,
    /// Largest distance travelled past the target, opposite the release offset.
    overshoot: f64,
    position: Point,
}

#[derive(Debug, Serialize)]
struct ProbeHit {
    id: MemberId,
    ring: Ring,
    distance: f64,
    style: MemberStyle,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::debug!(seed, "config loaded");

    match cli.command {
        Command::Place(args) => print_json(&run_place(&config, seed, &args)),
        Command::Simulate(args) => print_json(&run_simulate(config, seed, &args)),
        Command::Settle(args) => print_json(&run_settle(&config, &args)),
        Command::Probe(args) => print_json(&run_probe(config, seed, &args)),
    }
}

fn load_config(path: Option<&Path>) -> Result<CloudConfig, CliError> {
    let Some(path) = path else {
        return Ok(CloudConfig::default());
    };
    let json = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig { path: path.to_path_buf(), source })?;
    Ok(CloudConfig::from_json(&json)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn run_place(config: &CloudConfig, seed: u64, args: &PlaceArgs) -> Vec<Placement> {
    let mut rng = StdRng::seed_from_u64(seed);
    let placements = place_outer(args.count.unwrap_or(config.outer_count), config, &mut rng);
    let fallbacks = placements.iter().filter(|p| p.fallback).count();
    tracing::info!(placed = placements.len(), fallbacks, "outer ring placed");
    placements
}

fn run_simulate(config: CloudConfig, seed: u64, args: &SimulateArgs) -> SimulateReport {
    let mut core = CloudCore::with_seed(config, Roster::default(), seed);
    let mut actions = BTreeMap::new();
    tally(&mut actions, &core.init());
    for _ in 0..args.frames {
        tally(&mut actions, &core.tick(args.frame_ms));
    }
    tracing::info!(frames = args.frames, clock_ms = core.clock_ms(), "simulation finished");
    SimulateReport { frames: args.frames, actions, snapshot: core.snapshot() }
}

fn tally(counts: &mut BTreeMap<&'static str, usize>, batch: &[Action]) {
    for action in batch {
        *counts.entry(action_name(action)).or_insert(0) += 1;
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::ClearContainer => "clear_container",
        Action::MemberCreated { .. } => "member_created",
        Action::Move { .. } => "move",
        Action::Reveal { .. } => "reveal",
        Action::Restyle { .. } => "restyle",
        Action::MotionChanged { .. } => "motion_changed",
    }
}

fn run_settle(config: &CloudConfig, args: &SettleArgs) -> SettleReport {
    let params = SpringParams::from(config);
    let start = Point::new(args.dx, args.dy);
    let length = start.length();
    let direction = if length > 0.0 { start.scale(1.0 / length) } else { Point::ZERO };

    let mut spring = Spring::at_rest(start);
    let mut overshoot: f64 = 0.0;
    for step in 1..=args.max_steps {
        let (next, settled) = spring_step(spring, Point::ZERO, &params);
        if settled {
            tracing::info!(steps = step, overshoot, "spring settled");
            return SettleReport { steps: step, settled: true, overshoot, position: Point::ZERO };
        }
        spring = next;
        let along = spring.position.x * direction.x + spring.position.y * direction.y;
        overshoot = overshoot.max(-along);
    }
    tracing::warn!(max_steps = args.max_steps, "spring did not settle");
    SettleReport { steps: args.max_steps, settled: false, overshoot, position: spring.position }
}

fn run_probe(config: CloudConfig, seed: u64, args: &ProbeArgs) -> Vec<ProbeHit> {
    let mut core = CloudCore::with_seed(config, Roster::default(), seed);
    core.init();
    for _ in 0..args.frames {
        core.step();
    }
    let cursor = Point::new(args.x, args.y);
    // A zero-sized container at the origin makes client coordinates center-relative.
    core.on_hover(PointerSample::mouse(cursor.x, cursor.y), Rect::default());
    core.members()
        .filter(|m| !m.style.is_neutral())
        .filter_map(|m| {
            m.target.map(|target| ProbeHit { id: m.id, ring: m.ring, distance: target.distance(cursor), style: m.style })
        })
        .collect()
}
