//! Simulation configuration resource.
//!
//! Settings are loaded from an INI configuration file. Every value has a
//! default matching the reference demo, so a missing file or a missing key
//! is never an error.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 640
//! height = 480
//!
//! [physics]
//! hz = 30
//! gravity_x = 0.0
//! gravity_y = 9.81
//! velocity_iterations = 5
//! position_iterations = 5
//! pixels_per_meter = 40.0
//!
//! [spawner]
//! block_width = 20.0
//! block_height = 20.0
//!
//! [contacts]
//! remove_on_contact = false
//!
//! [loop]
//! accumulate = false
//! max_substeps = 5
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_WINDOW_WIDTH: u32 = 640;
const DEFAULT_WINDOW_HEIGHT: u32 = 480;
const DEFAULT_HZ: u32 = 30;
const DEFAULT_GRAVITY: (f32, f32) = (0.0, 9.81);
const DEFAULT_VELOCITY_ITERATIONS: usize = 5;
const DEFAULT_POSITION_ITERATIONS: usize = 5;
const DEFAULT_PIXELS_PER_METER: f32 = 40.0;
const DEFAULT_BLOCK_SIZE: f32 = 20.0;
const DEFAULT_MAX_SUBSTEPS: u32 = 5;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Global physics settings shared by the whole world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    /// Gravity in meters per second squared. Positive y points down the screen.
    pub gravity: (f32, f32),
    /// Fixed steps per simulated second.
    pub hz: u32,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    /// Conversion between world pixels and engine meters.
    pub pixels_per_meter: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            hz: DEFAULT_HZ,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            pixels_per_meter: DEFAULT_PIXELS_PER_METER,
        }
    }
}

impl PhysicsConfig {
    /// Length of one fixed step in seconds.
    pub fn timestep(&self) -> f32 {
        1.0 / self.hz.max(1) as f32
    }
}

/// Simulation configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct SimulationConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub physics: PhysicsConfig,
    /// Size of blocks created by the spawner, in pixels.
    pub block_width: f32,
    pub block_height: f32,
    /// Destroy dynamic bodies after their first contact instead of only
    /// logging the intent.
    pub remove_on_contact: bool,
    /// Run as many fixed ticks as the elapsed frame time allows instead of
    /// exactly one tick per frame.
    pub accumulate: bool,
    /// Upper bound on ticks per frame when accumulating.
    pub max_substeps: u32,
    pub config_path: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            physics: PhysicsConfig::default(),
            block_width: DEFAULT_BLOCK_SIZE,
            block_height: DEFAULT_BLOCK_SIZE,
            remove_on_contact: false,
            accumulate: false,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(ConfigError::Load)?;

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }

        // [physics] section
        if let Some(hz) = config.getuint("physics", "hz").ok().flatten() {
            self.physics.hz = (hz as u32).max(1);
        }
        if let Some(gx) = config.getfloat("physics", "gravity_x").ok().flatten() {
            self.physics.gravity.0 = gx as f32;
        }
        if let Some(gy) = config.getfloat("physics", "gravity_y").ok().flatten() {
            self.physics.gravity.1 = gy as f32;
        }
        if let Some(n) = config.getuint("physics", "velocity_iterations").ok().flatten() {
            self.physics.velocity_iterations = n as usize;
        }
        if let Some(n) = config.getuint("physics", "position_iterations").ok().flatten() {
            self.physics.position_iterations = n as usize;
        }
        if let Some(ppm) = config.getfloat("physics", "pixels_per_meter").ok().flatten() {
            if ppm > 0.0 {
                self.physics.pixels_per_meter = ppm as f32;
            }
        }

        // [spawner] section
        if let Some(w) = config.getfloat("spawner", "block_width").ok().flatten() {
            self.block_width = w as f32;
        }
        if let Some(h) = config.getfloat("spawner", "block_height").ok().flatten() {
            self.block_height = h as f32;
        }

        // [contacts] section
        if let Some(remove) = config.getbool("contacts", "remove_on_contact").ok().flatten() {
            self.remove_on_contact = remove;
        }

        // [loop] section
        if let Some(acc) = config.getbool("loop", "accumulate").ok().flatten() {
            self.accumulate = acc;
        }
        if let Some(n) = config.getuint("loop", "max_substeps").ok().flatten() {
            self.max_substeps = (n as u32).max(1);
        }

        info!(
            "Loaded config: {}x{} window, {} Hz, gravity=({}, {}), iterations={}/{}, remove_on_contact={}",
            self.window_width,
            self.window_height,
            self.physics.hz,
            self.physics.gravity.0,
            self.physics.gravity.1,
            self.physics.velocity_iterations,
            self.physics.position_iterations,
            self.remove_on_contact
        );

        Ok(())
    }

    /// Save configuration to the INI file, creating it if needed.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));

        config.set("physics", "hz", Some(self.physics.hz.to_string()));
        config.set("physics", "gravity_x", Some(self.physics.gravity.0.to_string()));
        config.set("physics", "gravity_y", Some(self.physics.gravity.1.to_string()));
        config.set(
            "physics",
            "velocity_iterations",
            Some(self.physics.velocity_iterations.to_string()),
        );
        config.set(
            "physics",
            "position_iterations",
            Some(self.physics.position_iterations.to_string()),
        );
        config.set(
            "physics",
            "pixels_per_meter",
            Some(self.physics.pixels_per_meter.to_string()),
        );

        config.set("spawner", "block_width", Some(self.block_width.to_string()));
        config.set("spawner", "block_height", Some(self.block_height.to_string()));

        config.set(
            "contacts",
            "remove_on_contact",
            Some(self.remove_on_contact.to_string()),
        );

        config.set("loop", "accumulate", Some(self.accumulate.to_string()));
        config.set("loop", "max_substeps", Some(self.max_substeps.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| ConfigError::Save(e.to_string()))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
