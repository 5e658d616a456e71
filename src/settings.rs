//! Stage settings
//!
//! World size, mining tuning, miner defaults and the layer catalog, loadable
//! from JSON. Every field has a default, so a settings file only needs to
//! name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{
    DepthRule, FallbackPolicy, FallingMiner, Generator, LayerCatalog, LayerDefinition,
    LayerWeight, MineRequest, Rgba8, TileImage,
};

/// How a layer's tile image is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileSpec {
    /// One flat color
    Solid { color: [u8; 4] },
    /// Base color with a regular scatter of a second color
    Speckled {
        base: [u8; 4],
        speck: [u8; 4],
        /// Roughly one speck per this many pixels
        every: usize,
    },
    /// Explicit row-major pixels, `tile_size * tile_size` of them
    Pixels { pixels: Vec<[u8; 4]> },
}

impl TileSpec {
    /// Render into a `tile_size x tile_size` image
    pub fn to_image(&self, tile_size: usize) -> Result<TileImage, ConfigError> {
        match self {
            TileSpec::Solid { color } => Ok(TileImage::solid(tile_size, (*color).into())),
            TileSpec::Speckled { base, speck, every } => {
                let every = (*every).max(1);
                let pixels = (0..tile_size * tile_size)
                    .map(|i| {
                        let (x, y) = (i % tile_size, i / tile_size);
                        // Skewed lattice so specks do not line up in columns
                        if (x * 3 + y * 7 + (x * y) % 5) % every == 0 {
                            Rgba8::from(*speck)
                        } else {
                            Rgba8::from(*base)
                        }
                    })
                    .collect();
                TileImage::new(tile_size, tile_size, pixels)
            }
            TileSpec::Pixels { pixels } => TileImage::new(
                tile_size,
                tile_size,
                pixels.iter().copied().map(Rgba8::from).collect(),
            ),
        }
    }
}

/// A layer as written in settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub tile: TileSpec,
    pub hardness: f32,
    pub reward_value: u32,
    #[serde(default)]
    pub rotatable: bool,
    #[serde(default)]
    pub selection_weight: f32,
}

impl LayerSpec {
    pub fn to_definition(&self, tile_size: usize) -> Result<LayerDefinition, ConfigError> {
        Ok(LayerDefinition {
            name: self.name.clone(),
            tile: self.tile.to_image(tile_size)?,
            hardness: self.hardness,
            reward_value: self.reward_value,
            rotatable: self.rotatable,
            selection_weight: self.selection_weight,
        })
    }
}

/// Defaults for spawned falling miners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerSettings {
    pub width: f32,
    pub height: f32,
    pub gravity: f32,
    pub mining_radius: i32,
    pub mining_power: f32,
}

impl Default for MinerSettings {
    fn default() -> Self {
        Self {
            width: MINER_WIDTH,
            height: MINER_HEIGHT,
            gravity: GRAVITY,
            mining_radius: MINER_RADIUS,
            mining_power: MINER_POWER,
        }
    }
}

impl MinerSettings {
    pub fn build(&self, id: u32, x: f32, y: f32) -> FallingMiner {
        let mut miner = FallingMiner::new(id, x, y);
        miner.body.width = self.width;
        miner.body.height = self.height;
        miner.gravity = self.gravity;
        miner.mining_radius = self.mining_radius;
        miner.mining_power = self.mining_power;
        miner
    }
}

/// Everything needed to build a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    /// World width in pixels
    pub width: usize,
    /// World height in pixels
    pub height: usize,
    pub tile_size: usize,
    /// Radius of a pointer mining hit
    pub mining_radius: i32,
    /// Durability removed per pointer mining hit
    pub mining_power: f32,
    /// Rows no depth rule covers
    pub fallback: FallbackPolicy,
    pub miner: MinerSettings,
    /// Ordered catalog; the first entry is the default layer
    pub layers: Vec<LayerSpec>,
    pub depth_rules: Vec<DepthRule>,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            width: STAGE_WIDTH,
            height: STAGE_HEIGHT,
            tile_size: TILE_SIZE,
            mining_radius: MINING_RADIUS,
            mining_power: MINING_POWER,
            fallback: FallbackPolicy::DefaultLayer,
            miner: MinerSettings::default(),
            layers: default_layers(),
            depth_rules: default_depth_rules(),
        }
    }
}

impl StageSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!(
            "Loaded settings from {} ({} layers)",
            path.display(),
            settings.layers.len()
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the layers and depth rules into a catalog
    pub fn build_catalog(&self) -> Result<LayerCatalog, ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize);
        }
        let layers = self
            .layers
            .iter()
            .map(|spec| spec.to_definition(self.tile_size))
            .collect::<Result<Vec<_>, _>>()?;
        LayerCatalog::new(layers, self.depth_rules.clone())
    }

    pub fn generator(&self) -> Generator {
        Generator::new(self.width, self.height, self.tile_size).with_fallback(self.fallback)
    }

    /// Pointer mining command at a grid pixel
    pub fn mine_request(&self, x: i32, y: i32) -> MineRequest {
        MineRequest::new(x, y, self.mining_radius, self.mining_power)
    }
}

fn default_layers() -> Vec<LayerSpec> {
    vec![
        LayerSpec {
            name: "Topsoil".to_string(),
            tile: TileSpec::Speckled {
                base: [139, 69, 19, 255],
                speck: [160, 92, 40, 255],
                every: 6,
            },
            hardness: 1.0,
            reward_value: 1,
            rotatable: true,
            selection_weight: 0.0,
        },
        LayerSpec {
            name: "Stone".to_string(),
            tile: TileSpec::Speckled {
                base: [118, 118, 126, 255],
                speck: [88, 88, 96, 255],
                every: 4,
            },
            hardness: 2.5,
            reward_value: 2,
            rotatable: true,
            selection_weight: 0.0,
        },
        LayerSpec {
            name: "Ore Vein".to_string(),
            tile: TileSpec::Speckled {
                base: [118, 118, 126, 255],
                speck: [232, 190, 48, 255],
                every: 3,
            },
            hardness: 3.5,
            reward_value: 5,
            rotatable: true,
            selection_weight: 0.0,
        },
    ]
}

/// Bands for the default 300px world in 10px tiles (depth rows 1..=30, top down)
fn default_depth_rules() -> Vec<DepthRule> {
    vec![
        DepthRule::new(1, 8, vec![LayerWeight::new("Topsoil", 1.0)]),
        DepthRule::new(
            9,
            20,
            vec![
                LayerWeight::new("Topsoil", 0.3),
                LayerWeight::new("Stone", 0.6),
                LayerWeight::new("Ore Vein", 0.1),
            ],
        ),
        DepthRule::new(
            21,
            30,
            vec![
                LayerWeight::new("Stone", 0.6),
                LayerWeight::new("Ore Vein", 0.4),
            ],
        ),
    ]
}
