//! Boxdrop main entry point.
//!
//! Click in the window to drop a block onto the platform. Every contact a
//! falling block makes is reported to the contact policy, which either logs
//! the deletion intent or flags the block for removal after the step.
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (defaults when missing) and apply command line flags
//! 2. Build the ECS world and place the static ground
//! 3. Each frame: forward input, tick the simulation at a fixed step, render
//!
//! # Running
//!
//! ```sh
//! cargo run --release --features window
//! cargo run --release -- --headless 120 --spawn 320,100 --spawn 330,40
//! ```

use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use boxdrop::error::SimulationError;
use boxdrop::events::spawn::SpawnRequest;
use boxdrop::game;
use boxdrop::registry;
use boxdrop::resources::simulationconfig::SimulationConfig;
use boxdrop::systems::simulation::tick;

/// Boxdrop: falling blocks with deferred, contact-driven removal
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Destroy each dynamic block after its first contact instead of only
    /// logging the intent.
    #[arg(long)]
    remove_on_contact: bool,

    /// Run as many fixed ticks as the frame time allows instead of one per frame.
    #[arg(long)]
    accumulate: bool,

    /// Run TICKS fixed ticks without a window, then print the bodies and exit.
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,

    /// Drop a block at X,Y (pixels) before the first tick. Repeatable.
    #[arg(long, value_name = "X,Y", value_parser = parse_point)]
    spawn: Vec<(f32, f32)>,
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{s}`"))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("bad x `{x}`: {e}"))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("bad y `{y}`: {e}"))?;
    Ok((x, y))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = SimulationConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        info!("Using default configuration ({})", e);
    }
    if cli.remove_on_contact {
        config.remove_on_contact = true;
    }
    if cli.accumulate {
        config.accumulate = true;
    }

    let mut world = match game::setup(config) {
        Ok(world) => world,
        Err(e) => {
            error!("Failed to set up the world: {}", e);
            std::process::exit(1);
        }
    };

    for &(x, y) in &cli.spawn {
        world.trigger(SpawnRequest { x, y });
    }
    world.flush();

    let result = match cli.headless {
        Some(ticks) => run_headless(&mut world, ticks),
        None => run_window(&mut world),
    };
    if let Err(e) = result {
        error!("Simulation stopped: {}", e);
        std::process::exit(1);
    }
}

fn run_headless(world: &mut World, ticks: u64) -> Result<(), SimulationError> {
    let step = world.resource::<SimulationConfig>().physics.timestep();
    let mut begins = 0;
    let mut destroyed = 0;
    for _ in 0..ticks {
        let report = tick(world, step)?;
        begins += report.begin_count();
        destroyed += report.destroyed.len();
    }

    info!(
        "Ran {} ticks: {} begin contacts, {} bodies destroyed",
        ticks, begins, destroyed
    );
    registry::for_each_body(world, |body| {
        info!(
            "{:?} {} at ({:.2}, {:.2}) angle {:.3}",
            body.entity,
            body.kind.name(),
            body.pose.position.x,
            body.pose.position.y,
            body.pose.angle
        );
    });
    Ok(())
}

#[cfg(feature = "window")]
fn run_window(world: &mut World) -> Result<(), SimulationError> {
    use boxdrop::systems::input::poll_input;
    use boxdrop::systems::render::render_pass;
    use boxdrop::systems::simulation::advance;

    let config = world.resource::<SimulationConfig>().clone();
    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .title("Boxdrop")
        .build();
    rl.set_target_fps(config.physics.hz);

    info!("Instructions:");
    info!(" Click mouse in window to create a block that falls");

    let step = config.physics.timestep();
    while !rl.window_should_close() {
        poll_input(world, &mut rl);

        if config.accumulate {
            advance(world, rl.get_frame_time(), config.max_substeps)?;
        } else {
            tick(world, step)?;
        }

        let mut d = rl.begin_drawing(&thread);
        render_pass(world, &mut d);
    }
    Ok(())
}

#[cfg(not(feature = "window"))]
fn run_window(_world: &mut World) -> Result<(), SimulationError> {
    error!("Built without the `window` feature; pass --headless <TICKS> or rebuild with --features window");
    std::process::exit(2);
}
