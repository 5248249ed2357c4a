#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command line adapter that replays recorded opponent turns through the
//! tracking engine and plans routes with the path finder.

mod replay;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sonar_hunt_core::{AgentState, Coordinate, EngineConfig, PathStep, TracingSink};
use sonar_hunt_system_pathfinder::PathFinder;
use sonar_hunt_system_tracking::TrackingEngine;
use sonar_hunt_world::Grid;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::replay::{parse_script, ReplayEvent, StartupMap};

#[derive(Debug, Parser)]
#[command(name = "sonar-hunt", about = "Offline planning and opponent tracking")]
struct Cli {
    /// TOML file overriding the default engine tuning.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plans a coverage path, choosing the start cell unless one is given.
    Plan {
        /// Startup map in the turn protocol format.
        #[arg(long, value_name = "FILE")]
        map: PathBuf,
        /// Start cell as `x,y`.
        #[arg(long, value_parser = parse_coordinate)]
        start: Option<Coordinate>,
    },
    /// Plans a short route between two cells.
    Route {
        /// Startup map in the turn protocol format.
        #[arg(long, value_name = "FILE")]
        map: PathBuf,
        /// Origin cell as `x,y`.
        #[arg(long, value_parser = parse_coordinate)]
        from: Coordinate,
        /// Destination cell as `x,y`.
        #[arg(long, value_parser = parse_coordinate)]
        to: Coordinate,
        /// Plans a torpedo trajectory instead of a submarine route.
        #[arg(long)]
        torpedo: bool,
    },
    /// Replays a script of opponent turns and prints one report per turn.
    Track {
        /// Startup map in the turn protocol format.
        #[arg(long, value_name = "FILE")]
        map: PathBuf,
        /// Replay script.
        #[arg(long, value_name = "FILE")]
        script: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct PlannedStep {
    x: i32,
    y: i32,
    direction: Option<char>,
}

#[derive(Debug, Serialize)]
struct PlanReport {
    start: Option<Coordinate>,
    iterations: usize,
    path: Vec<PlannedStep>,
}

#[derive(Debug, Serialize)]
struct TurnReport {
    turn: usize,
    orders: Vec<String>,
    opponent_life: u32,
    candidates: usize,
    hypotheses: usize,
    scenarios: usize,
    start_positions: usize,
    busiest_region: Option<u32>,
    located: Option<Coordinate>,
    positions: Vec<Coordinate>,
}

/// Entry point for the sonar-hunt command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Plan { map, start } => {
            let grid = load_grid(&map)?;
            plan(grid, &config, start)
        }
        Command::Route {
            map,
            from,
            to,
            torpedo,
        } => {
            let grid = load_grid(&map)?;
            route(grid, &config, from, to, torpedo)
        }
        Command::Track { map, script } => {
            let grid = load_grid(&map)?;
            let source = fs::read_to_string(&script)
                .with_context(|| format!("failed to read script {}", script.display()))?;
            let events = parse_script(&source)
                .with_context(|| format!("failed to parse script {}", script.display()))?;
            track(grid, &config, &events)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&source).with_context(|| format!("failed to parse config {}", path.display()))
}

fn load_grid(path: &Path) -> Result<Arc<Grid>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read map {}", path.display()))?;
    let map = StartupMap::parse(&source)
        .with_context(|| format!("failed to parse map {}", path.display()))?;
    info!(
        width = map.grid.width(),
        height = map.grid.height(),
        navigable = map.grid.navigable_cells().len(),
        player = map.player_id,
        "map loaded"
    );
    Ok(Arc::new(map.grid))
}

fn plan(grid: Arc<Grid>, config: &EngineConfig, start: Option<Coordinate>) -> Result<()> {
    let mut finder = PathFinder::with_sink(Arc::clone(&grid), config.search.clone(), TracingSink);
    let path = match start {
        Some(coordinate) => {
            let cell = grid
                .index_of(coordinate)
                .with_context(|| format!("start {coordinate:?} lies outside the map"))?;
            finder.search_longest_path(cell)
        }
        None => finder
            .search_start_cell()
            .map(|start| start.path)
            .unwrap_or_default(),
    };
    let report = PlanReport {
        start: path.first().and_then(|step| grid.coordinate_of(step.cell)),
        iterations: finder.last_iterations(),
        path: planned_steps(&grid, &path),
    };
    print_json(&report)
}

fn route(
    grid: Arc<Grid>,
    config: &EngineConfig,
    from: Coordinate,
    to: Coordinate,
    torpedo: bool,
) -> Result<()> {
    let start = grid
        .index_of(from)
        .with_context(|| format!("origin {from:?} lies outside the map"))?;
    let target = grid
        .index_of(to)
        .with_context(|| format!("destination {to:?} lies outside the map"))?;
    let mut finder = PathFinder::with_sink(Arc::clone(&grid), config.search.clone(), TracingSink);
    let path = if torpedo {
        finder.search_torpedo_path(start, target)
    } else {
        finder.search_shortest_path(start, target)
    };
    let report = PlanReport {
        start: Some(from),
        iterations: finder.last_iterations(),
        path: planned_steps(&grid, &path),
    };
    print_json(&report)
}

fn track(grid: Arc<Grid>, config: &EngineConfig, events: &[ReplayEvent]) -> Result<()> {
    let mut engine = TrackingEngine::with_sink(Arc::clone(&grid), config.tracking.clone(), TracingSink);
    let mut opponent = AgentState::default();
    let mut turn = 0;

    for event in events {
        match event {
            ReplayEvent::Turn {
                opponent_life,
                orders,
            } => {
                turn += 1;
                opponent.record_life(*opponent_life);
                engine.apply_orders(orders, opponent.last_life_lost());

                let stats = engine.position_stats();
                let report = TurnReport {
                    turn,
                    orders: orders.iter().map(ToString::to_string).collect(),
                    opponent_life: opponent.life(),
                    candidates: stats.candidate_count(),
                    hypotheses: stats.hypothesis_count,
                    scenarios: stats.scenario_count,
                    start_positions: stats.start_position_count,
                    busiest_region: stats.busiest_region().map(|region| region.get()),
                    located: stats
                        .locate(&grid)
                        .and_then(|cell| grid.coordinate_of(cell)),
                    positions: stats
                        .candidates()
                        .filter_map(|cell| grid.coordinate_of(cell))
                        .collect(),
                };
                print_json(&report)?;
            }
            ReplayEvent::Sonar { region, result } => {
                engine.apply_sonar_result(*region, *result);
            }
            ReplayEvent::Attack { target, life_lost } => {
                engine.apply_attack_outcome(*target, *life_lost);
            }
        }
    }
    Ok(())
}

fn planned_steps(grid: &Grid, path: &[PathStep]) -> Vec<PlannedStep> {
    path.iter()
        .filter_map(|step| {
            grid.coordinate_of(step.cell).map(|coordinate| PlannedStep {
                x: coordinate.x(),
                y: coordinate.y(),
                direction: step.direction.map(|direction| direction.symbol()),
            })
        })
        .collect()
}

fn print_json<T>(value: &T) -> Result<()>
where
    T: Serialize,
{
    let line = serde_json::to_string(value).context("failed to serialise report")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}").context("failed to write report")
}

fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, found '{value}'"))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid column '{x}': {error}"))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid row '{y}': {error}"))?;
    Ok(Coordinate::new(x, y))
}
