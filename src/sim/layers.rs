//! Layer catalog and depth rules
//!
//! The catalog is an ordered list of materials; entry 0 is the default layer
//! used wherever no depth rule applies. Depth rules pick among catalog entries
//! by name for a band of depth rows. Both are validated once, up front.

use serde::{Deserialize, Serialize};

use super::grid::Rgba8;
use crate::error::ConfigError;

/// RGBA source image for one layer, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgba8>,
}

impl TileImage {
    pub fn new(width: usize, height: usize, pixels: Vec<Rgba8>) -> Result<Self, ConfigError> {
        if pixels.len() != width * height {
            return Err(ConfigError::InvalidTileImage {
                expected: width * height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A `size x size` image of one color
    pub fn solid(size: usize, color: Rgba8) -> Self {
        Self {
            width: size,
            height: size,
            pixels: vec![color; size * size],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// Pixel at a row-major index
    #[inline]
    pub fn sample(&self, index: usize) -> Rgba8 {
        self.pixels[index]
    }
}

/// A material layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDefinition {
    /// Unique key referenced by depth rules
    pub name: String,
    pub tile: TileImage,
    /// Starting durability of every cell of this layer
    pub hardness: f32,
    /// Reward for destroying one cell
    pub reward_value: u32,
    /// Whether generation may rotate the tile
    pub rotatable: bool,
    /// Weight used when no depth rule covers a row and the generator
    /// falls back to catalog weights
    pub selection_weight: f32,
}

/// One weighted choice inside a depth rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeight {
    pub layer: String,
    pub probability: f32,
}

impl LayerWeight {
    pub fn new(layer: impl Into<String>, probability: f32) -> Self {
        Self {
            layer: layer.into(),
            probability,
        }
    }
}

/// Weighted layer table for an inclusive band of depth rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthRule {
    pub start_row: i32,
    pub end_row: i32,
    pub entries: Vec<LayerWeight>,
}

impl DepthRule {
    pub fn new(start_row: i32, end_row: i32, entries: Vec<LayerWeight>) -> Self {
        Self {
            start_row,
            end_row,
            entries,
        }
    }

    #[inline]
    pub fn contains(&self, row: i32) -> bool {
        row >= self.start_row && row <= self.end_row
    }
}

/// A depth rule with names already resolved to catalog indices
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedRule {
    /// (catalog index, weight)
    pub entries: Vec<(usize, f32)>,
}

/// Validated layers plus depth rules
#[derive(Debug, Clone)]
pub struct LayerCatalog {
    layers: Vec<LayerDefinition>,
    rules: Vec<DepthRule>,
    resolved: Vec<ResolvedRule>,
}

impl LayerCatalog {
    /// Validate and build a catalog.
    ///
    /// Fails on an empty catalog, duplicate names, non-positive hardness,
    /// negative weights, inverted or overlapping row ranges, and rule entries
    /// naming layers that do not exist.
    pub fn new(layers: Vec<LayerDefinition>, rules: Vec<DepthRule>) -> Result<Self, ConfigError> {
        if layers.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        for (i, layer) in layers.iter().enumerate() {
            if layers[..i].iter().any(|l| l.name == layer.name) {
                return Err(ConfigError::DuplicateLayer(layer.name.clone()));
            }
            if !layer.hardness.is_finite() || layer.hardness <= 0.0 {
                return Err(ConfigError::InvalidHardness {
                    name: layer.name.clone(),
                    hardness: layer.hardness,
                });
            }
            check_weight(&layer.name, layer.selection_weight)?;
        }

        let mut resolved = Vec::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if rule.start_row > rule.end_row {
                return Err(ConfigError::InvalidRowRange {
                    rule: i,
                    start: rule.start_row,
                    end: rule.end_row,
                });
            }
            if let Some(first) = rules[..i]
                .iter()
                .position(|r| r.start_row <= rule.end_row && rule.start_row <= r.end_row)
            {
                return Err(ConfigError::OverlappingRules { first, second: i });
            }

            let mut entries = Vec::with_capacity(rule.entries.len());
            for entry in &rule.entries {
                check_weight(&entry.layer, entry.probability)?;
                let index = layers
                    .iter()
                    .position(|l| l.name == entry.layer)
                    .ok_or_else(|| ConfigError::UnknownLayer {
                        rule: i,
                        name: entry.layer.clone(),
                    })?;
                entries.push((index, entry.probability));
            }
            resolved.push(ResolvedRule { entries });
        }

        Ok(Self {
            layers,
            rules,
            resolved,
        })
    }

    pub fn layers(&self) -> &[LayerDefinition] {
        &self.layers
    }

    pub fn rules(&self) -> &[DepthRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LayerDefinition> {
        self.layers.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// The default layer used for rows no rule covers
    pub fn default_layer(&self) -> &LayerDefinition {
        &self.layers[0]
    }

    /// First rule whose row range contains `row`
    pub(crate) fn rule_for_row(&self, row: i32) -> Option<&ResolvedRule> {
        self.rules
            .iter()
            .position(|r| r.contains(row))
            .map(|i| &self.resolved[i])
    }
}

fn check_weight(name: &str, weight: f32) -> Result<(), ConfigError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ConfigError::InvalidWeight {
            name: name.to_string(),
            weight,
        });
    }
    Ok(())
}
