//! Simulation configuration.
//!
//! Settings loaded from an INI configuration file, with safe defaults so
//! a missing file never blocks startup.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! tick_rate = 60
//!
//! [interpolation]
//! delay_ms = 100
//!
//! [collision]
//! cell_size = 32.0
//! ```

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_INTERP_DELAY_MS: f64 = 100.0;
const DEFAULT_COLLISION_CELL_SIZE: f32 = 32.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Simulation settings.
///
/// Covers the producer's tick rate, the consumer-side interpolation
/// delay, and the broad-phase grid cell size.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Simulation steps per second.
    pub tick_rate: u32,
    /// How far behind the producer the interpolated view runs.
    pub interp_delay_ms: f64,
    /// Broad-phase grid cell size in world units.
    pub collision_cell_size: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimConfig {
    /// Create a configuration with safe default values.
    pub fn new() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            interp_delay_ms: DEFAULT_INTERP_DELAY_MS,
            collision_cell_size: DEFAULT_COLLISION_CELL_SIZE,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Seconds of simulated time per tick.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        if let Some(rate) = config.getuint("simulation", "tick_rate").ok().flatten() {
            self.tick_rate = rate as u32;
        }
        if let Some(delay) = config.getfloat("interpolation", "delay_ms").ok().flatten() {
            self.interp_delay_ms = delay;
        }
        if let Some(cell) = config.getfloat("collision", "cell_size").ok().flatten() {
            self.collision_cell_size = cell as f32;
        }

        info!(
            "Loaded config: tick_rate={}, interp_delay_ms={}, collision_cell_size={}",
            self.tick_rate, self.interp_delay_ms, self.collision_cell_size
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    #[allow(dead_code)]
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set(
            "simulation",
            "tick_rate",
            Some(self.tick_rate.to_string()),
        );
        config.set(
            "interpolation",
            "delay_ms",
            Some(self.interp_delay_ms.to_string()),
        );
        config.set(
            "collision",
            "cell_size",
            Some(self.collision_cell_size.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
