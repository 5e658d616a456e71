//! Stage: one play session's terrain, wallet and agents
//!
//! The stage owns the grid outright. Callers drive it with explicit commands
//! (`mine_at`, `spawn_miner`, `tick`) from their own event loop and read back
//! results; nothing here holds callbacks or global state.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agent::FallingMiner;
use super::grid::{Rect, TerrainGrid};
use super::layers::LayerCatalog;
use super::mine::{MineResult, mine};
use crate::error::ConfigError;
use crate::settings::StageSettings;

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageEvent {
    /// A miner destroyed cells this tick
    Mined { miner: u32, reward: u32, dirty: Rect },
    /// A miner touched ground after falling
    Landed { miner: u32 },
}

/// A generated world plus everything mutating it
#[derive(Debug, Clone)]
pub struct Stage {
    seed: u64,
    settings: StageSettings,
    catalog: LayerCatalog,
    grid: TerrainGrid,
    money: u64,
    miners: Vec<FallingMiner>,
    /// Union of regions changed since the last `take_dirty`
    dirty: Option<Rect>,
    time_ticks: u64,
    next_id: u32,
}

impl Stage {
    /// Build the catalog from `settings` and generate terrain from `seed`
    pub fn new(settings: &StageSettings, seed: u64) -> Result<Self, ConfigError> {
        let catalog = settings.build_catalog()?;
        let mut rng = Pcg32::seed_from_u64(seed);
        let grid = settings.generator().generate(&catalog, &mut rng)?;

        log::info!(
            "Stage ready: seed {}, {} layers, {} depth rules",
            seed,
            catalog.len(),
            catalog.rules().len()
        );

        Ok(Self {
            seed,
            settings: settings.clone(),
            catalog,
            grid,
            money: 0,
            miners: Vec::new(),
            dirty: None,
            time_ticks: 0,
            next_id: 1,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    /// Total reward earned this session
    pub fn money(&self) -> u64 {
        self.money
    }

    pub fn miners(&self) -> &[FallingMiner] {
        &self.miners
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Mine at a grid pixel with the configured radius and power
    pub fn mine_at(&mut self, x: i32, y: i32) -> MineResult {
        let result = mine(&mut self.grid, &self.settings.mine_request(x, y));
        self.credit(&result);
        result
    }

    /// Drop a falling miner with its bottom-left corner at `(x, y)`
    pub fn spawn_miner(&mut self, x: f32, y: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.miners.push(self.settings.miner.build(id, x, y));
        id
    }

    /// Advance every miner by `dt` seconds, in spawn order
    pub fn tick(&mut self, dt: f32) -> Vec<StageEvent> {
        self.time_ticks += 1;
        let mut events = Vec::new();
        let mut results = Vec::with_capacity(self.miners.len());

        for miner in &mut self.miners {
            let was_grounded = miner.grounded;
            let step = miner.update(&mut self.grid, dt);

            if step.grounded && !was_grounded {
                events.push(StageEvent::Landed { miner: miner.id });
            }
            if let Some(dirty) = step.mined.dirty {
                events.push(StageEvent::Mined {
                    miner: miner.id,
                    reward: step.mined.reward,
                    dirty,
                });
            }
            results.push(step.mined);
        }

        for result in &results {
            self.credit(result);
        }
        events
    }

    /// Region changed since the last call, if any
    pub fn take_dirty(&mut self) -> Option<Rect> {
        self.dirty.take()
    }

    fn credit(&mut self, result: &MineResult) {
        self.money += u64::from(result.reward);
        if let Some(rect) = result.dirty {
            self.dirty = Some(match self.dirty {
                Some(acc) => acc.union(&rect),
                None => rect,
            });
        }
    }
}
