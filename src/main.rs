//! # Voxel Terrain Headless Runner
//!
//! Drives the terrain engine without a renderer: a player walks along a
//! straight line, digs or builds below itself on every step and the recorded
//! edits are saved at the end.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- --steps 400 --direction 1,0.5 --build-every 3
//! ```

use std::path::PathBuf;

use cgmath::{InnerSpace, Point3, Vector3};
use clap::Parser;
use log::{error, info};

use voxel_terrain::core::Ray;
use voxel_terrain::engine_state::voxels::biome::BiomeId;
use voxel_terrain::engine_state::voxels::world::WorldEvent;
use voxel_terrain::{EngineState, TerrainSettings, VoxelResult};

#[derive(Parser, Debug)]
#[command(name = "voxel-terrain")]
#[command(about = "Walk a player through streamed voxel terrain and record edits")]
struct Args {
    /// Terrain settings JSON file (defaults are used when omitted)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Change log file read at startup and written at the end
    #[arg(short, long, default_value = "changes.json")]
    changes: PathBuf,

    /// Number of ticks to walk
    #[arg(long, default_value = "200")]
    steps: usize,

    /// Distance walked per tick, in world units
    #[arg(long, default_value = "1.0")]
    speed: f32,

    /// Walking direction on the ground plane as "x,z"
    #[arg(long, value_parser = parse_direction, default_value = "1,0")]
    direction: Vector3<f32>,

    /// Build a voxel instead of digging on every n-th step (0 to never build)
    #[arg(long, default_value = "4")]
    build_every: usize,

    /// Biome index of built voxels
    #[arg(long, default_value = "2")]
    biome: usize,

    /// Discard previously recorded edits before walking
    #[arg(long)]
    reset: bool,
}

fn parse_direction(value: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, z] = parts.as_slice() else {
        return Err(format!("expected \"x,z\", got \"{}\"", value));
    };
    let x: f32 = x.parse().map_err(|_| format!("invalid x component \"{}\"", x))?;
    let z: f32 = z.parse().map_err(|_| format!("invalid z component \"{}\"", z))?;

    let direction = Vector3::new(x, 0.0, z);
    if direction.magnitude2() == 0.0 {
        return Err("direction must not be zero".to_string());
    }
    Ok(direction.normalize())
}

fn main() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let args = Args::parse();
    if let Err(err) = run(&args) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> VoxelResult<()> {
    let settings = match &args.settings {
        Some(path) => TerrainSettings::load(path)?,
        None => TerrainSettings::default(),
    };

    let mut engine = EngineState::new(settings, args.changes.clone())?;
    if args.reset {
        engine.reset_changes();
    }
    engine.drain_events();

    let reach = engine.settings().world_height_ws() * 2.0;
    let mut player = engine.world().spawn_position();
    let (mut dug, mut built) = (0usize, 0usize);

    for step in 0..args.steps {
        player += args.direction * args.speed;
        engine.tick(player);

        let ground = engine.get_column_top_height(player).unwrap_or(0.0);
        let ray = Ray::new(
            Point3::new(player.x, ground + reach, player.z),
            Vector3::new(0.0, -1.0, 0.0),
        );

        if let Some(hit) = engine.get_voxel_ray_intersection(&ray, Some(reach * 2.0))? {
            let building = args.build_every > 0 && step % args.build_every == 0;
            if building {
                let above = hit.point + hit.normal * (engine.settings().voxel_size * 0.5);
                if engine.add_voxel_to_world_pos(above, BiomeId(args.biome))? {
                    built += 1;
                }
            } else {
                let inside = hit.point - hit.normal * (engine.settings().voxel_size * 0.5);
                if engine.remove_voxel_on_world_pos(inside) {
                    dug += 1;
                }
            }
        }

        for event in engine.drain_events() {
            match event {
                WorldEvent::SectorGenerated { slot } => {
                    info!("Step {}: generated sector ({}, {})", step, slot.x, slot.z)
                }
                WorldEvent::SectorEvicted { slot } => {
                    info!("Step {}: evicted sector ({}, {})", step, slot.x, slot.z)
                }
                _ => {}
            }
        }
    }

    info!(
        "Walked {} steps to ({:.1}, {:.1}): dug {} voxels, built {}",
        args.steps, player.x, player.z, dug, built
    );
    engine.save()
}
