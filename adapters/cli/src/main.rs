#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Umbra headless.

mod input;
mod logging;
mod simulation;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use serde::Serialize;
use tracing::info;
use umbra_core::config::GameProperties;
use umbra_world::{query, Map};

use crate::{
    input::{parse_point, InputScript, InputSegment},
    simulation::{Aim, Simulation},
};

const DEFAULT_STEPS: u64 = 600;

/// Headless runner for Umbra maps.
#[derive(Debug, Parser)]
#[command(name = "umbra", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate the player and the pursuing enemy for a number of fixed steps.
    Run(RunArgs),
    /// Print structural statistics of a scene.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Scene description to load.
    #[arg(long, value_name = "FILE")]
    scene: PathBuf,
    /// Game properties; defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Steps to simulate; defaults to the length of the input script, or 600.
    #[arg(long)]
    steps: Option<u64>,
    /// Keys the player holds, as KEYS:STEPS with keys from `wasd` or `-`; repeatable.
    #[arg(long = "player-input", value_name = "KEYS:STEPS", allow_hyphen_values = true)]
    player_input: Vec<InputSegment>,
    /// Point the player faces; the player faces the enemy when omitted.
    #[arg(
        long = "look-at",
        value_name = "X,Y",
        value_parser = parse_point,
        allow_hyphen_values = true
    )]
    look_at: Option<Vec2>,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Scene description to load.
    #[arg(long, value_name = "FILE")]
    scene: PathBuf,
    /// Print the statistics as JSON.
    #[arg(long)]
    json: bool,
}

/// Structural statistics reported by `inspect`.
#[derive(Debug, Serialize)]
struct InspectReport {
    vertices: usize,
    polygons: usize,
    triangles: usize,
    polygon_nodes: usize,
    polygon_depth: usize,
    edges: usize,
    degenerate_edges: usize,
    cells: usize,
    overlaps: usize,
    entity_nodes: usize,
    entity_depth: usize,
    bounds: [f32; 4],
}

/// Entry point for the Umbra command-line interface.
fn main() -> Result<()> {
    logging::init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Inspect(args) => inspect(args),
    }
}

fn load_map(path: &Path) -> Result<Map> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    Map::from_json_str(&raw)
        .with_context(|| format!("failed to load scene {}", path.display()))
}

fn load_properties(path: Option<&Path>) -> Result<GameProperties> {
    let Some(path) = path else {
        return Ok(GameProperties::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let properties: GameProperties = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;

    if !(properties.step_time > 0.0) {
        bail!("step_time must be positive (received {})", properties.step_time);
    }
    let agents = [("player", &properties.player), ("enemy", &properties.enemy)];
    for (name, agent) in agents {
        if !(agent.maximum_speed > 0.0) || !(agent.radius > 0.0) {
            bail!("{name} maximum_speed and radius must be positive");
        }
    }
    Ok(properties)
}

fn run(args: RunArgs) -> Result<()> {
    let map = load_map(&args.scene)?;
    let properties = load_properties(args.config.as_deref())?;

    let mut script = InputScript::new(args.player_input);
    let steps = args.steps.unwrap_or_else(|| match script.len() {
        0 => DEFAULT_STEPS,
        scripted => scripted,
    });
    let aim = args.look_at.map_or(Aim::Enemy, Aim::Point);

    info!(steps, scene = %args.scene.display(), "starting run");
    let mut simulation = Simulation::new(map, properties);
    simulation.run(steps, aim, || script.next_keys());
    let summary = simulation.summary();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?
        );
        return Ok(());
    }

    println!(
        "steps:            {} ({:.2} s)",
        summary.steps, summary.simulated_seconds
    );
    println!(
        "player:           ({:.3}, {:.3})",
        summary.player[0], summary.player[1]
    );
    println!(
        "enemy:            ({:.3}, {:.3})",
        summary.enemy[0], summary.enemy[1]
    );
    println!("enemy distance:   {:.3}", summary.enemy_distance);
    match summary.caught_at_step {
        Some(step) => println!("caught at step:   {step}"),
        None => println!("caught at step:   never"),
    }
    println!("path refreshes:   {}", summary.path_refreshes);
    println!("unreachable:      {} steps", summary.unreachable_steps);
    println!(
        "player contacts:  {} ({} stalled)",
        summary.player_collisions, summary.player_stalls
    );
    println!(
        "enemy contacts:   {} ({} stalled)",
        summary.enemy_collisions, summary.enemy_stalls
    );
    println!(
        "last frame:       {} triangles, {} shadow casters",
        summary.visible_triangles, summary.shadow_casters
    );
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
    let map = load_map(&args.scene)?;
    let stats = query::stats(&map);
    let bounds = map.bounds();
    let report = InspectReport {
        vertices: stats.vertices,
        polygons: stats.polygons,
        triangles: stats.triangles,
        polygon_nodes: stats.polygon_nodes,
        polygon_depth: stats.polygon_depth,
        edges: stats.edges,
        degenerate_edges: stats.degenerate_edges,
        cells: stats.cells,
        overlaps: stats.overlaps,
        entity_nodes: stats.entity_nodes,
        entity_depth: stats.entity_depth,
        bounds: [bounds.left(), bounds.right(), bounds.bottom(), bounds.top()],
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
        return Ok(());
    }

    println!("vertices:         {}", report.vertices);
    println!(
        "polygons:         {} ({} triangles, {} nodes, depth {})",
        report.polygons, report.triangles, report.polygon_nodes, report.polygon_depth
    );
    println!(
        "edges:            {} ({} degenerate)",
        report.edges, report.degenerate_edges
    );
    println!(
        "cells:            {} ({} overlaps)",
        report.cells, report.overlaps
    );
    println!(
        "entity tree:      {} nodes, depth {}",
        report.entity_nodes, report.entity_depth
    );
    println!(
        "bounds:           [{}, {}] x [{}, {}]",
        report.bounds[0], report.bounds[1], report.bounds[2], report.bounds[3]
    );
    Ok(())
}
