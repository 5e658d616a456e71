//! Falling miner agent
//!
//! A box that falls under gravity, stops on solid ground, and digs the terrain
//! just below its feet every update. Once the cells under it are gone it falls
//! again, so it tunnels straight down through the layers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{BodyRect, move_swept_with_limit};
use super::grid::TerrainGrid;
use super::mine::{MineRequest, MineResult, mine};
use crate::consts::*;

/// Result of one agent update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MinerStep {
    /// Vertical position did not change this update
    pub grounded: bool,
    pub mined: MineResult,
}

/// A digger that falls through the terrain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingMiner {
    pub id: u32,
    pub body: BodyRect,
    /// Pixels per second
    pub velocity: Vec2,
    /// Pixels per second squared (negative pulls down)
    pub gravity: f32,
    pub mining_radius: i32,
    pub mining_power: f32,
    /// Sub-step cap for each move
    #[serde(default = "default_substeps")]
    pub max_substeps: u32,
    /// Grounded on the previous update
    #[serde(default)]
    pub grounded: bool,
}

fn default_substeps() -> u32 {
    MAX_MOVE_SUBSTEPS
}

impl FallingMiner {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            body: BodyRect::new(x, y, MINER_WIDTH, MINER_HEIGHT),
            velocity: Vec2::ZERO,
            gravity: GRAVITY,
            mining_radius: MINER_RADIUS,
            mining_power: MINER_POWER,
            max_substeps: MAX_MOVE_SUBSTEPS,
            grounded: false,
        }
    }

    /// Advance by `dt` seconds: fall, land, then dig below
    pub fn update(&mut self, grid: &mut TerrainGrid, dt: f32) -> MinerStep {
        self.velocity.y += self.gravity * dt;

        // Only the vertical component moves a falling miner
        let delta = Vec2::new(0.0, self.velocity.y * dt);
        let start_y = self.body.y;
        let pos = move_swept_with_limit(grid, &self.body, delta, self.max_substeps);
        self.body = self.body.at(pos);

        let grounded = (pos.y - start_y).abs() <= f32::EPSILON * start_y.abs().max(1.0);
        if grounded {
            self.velocity.y = 0.0;
        }
        self.grounded = grounded;

        let bite = self.body.bottom_center();
        let mined = mine(
            grid,
            &MineRequest::new(
                bite.x.floor() as i32,
                bite.y.floor() as i32,
                self.mining_radius,
                self.mining_power,
            ),
        );

        MinerStep { grounded, mined }
    }
}
