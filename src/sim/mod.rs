//! Deterministic terrain simulation
//!
//! All terrain logic lives here. Nothing in this module renders, reads input
//! or touches the platform:
//! - Seeded RNG only (generation is the only consumer)
//! - The grid is mutated only by `mine`
//! - Movement reads the grid and never writes it

pub mod agent;
pub mod collision;
pub mod generate;
pub mod grid;
pub mod layers;
pub mod mine;
pub mod stage;

pub use agent::{FallingMiner, MinerStep};
pub use collision::{BodyRect, move_swept, move_swept_with_limit};
pub use generate::{
    FallbackPolicy, Generator, Rotation, depth_row, generate, pick_weighted, rotated_index,
};
pub use grid::{InvariantViolation, LayerInfo, Rect, Rgba8, TerrainGrid};
pub use layers::{DepthRule, LayerCatalog, LayerDefinition, LayerWeight, TileImage};
pub use mine::{MineRequest, MineResult, mine};
pub use stage::{Stage, StageEvent};
