//! Pixel Dig - destructible layered pixel terrain
//!
//! Core modules:
//! - `sim`: Deterministic terrain (generation, mining, swept collision, agents)
//! - `settings`: Data-driven world and catalog configuration
//! - `error`: Configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{LayerSpec, MinerSettings, StageSettings, TileSpec};

/// Simulation constants and tuning defaults
pub mod consts {
    /// Fixed update timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Upper bound on collision sub-steps per move; longer moves are shortened
    pub const MAX_MOVE_SUBSTEPS: u32 = 256;

    /// Default world size in pixels
    pub const STAGE_WIDTH: usize = 500;
    pub const STAGE_HEIGHT: usize = 300;
    /// Default generation tile edge in pixels
    pub const TILE_SIZE: usize = 10;

    /// Pointer mining defaults
    pub const MINING_RADIUS: i32 = 6;
    pub const MINING_POWER: f32 = 1.0;

    /// Falling miner defaults
    pub const MINER_WIDTH: f32 = 4.0;
    pub const MINER_HEIGHT: f32 = 4.0;
    pub const MINER_RADIUS: i32 = 3;
    pub const MINER_POWER: f32 = 1.0;
    /// Downward pull in pixels/s²
    pub const GRAVITY: f32 = -200.0;

    /// Seed used when none is given
    pub const DEFAULT_SEED: u64 = 0x5EED_D1C5;
}
