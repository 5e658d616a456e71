//! Terrain generation
//!
//! The grid is cut into `tile_size x tile_size` tiles. Each tile picks one
//! layer (weighted by the depth rule covering its depth row), optionally
//! rotates that layer's tile image, and stamps it into the grid. Trailing
//! partial tiles at the right and top edges are clipped.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{LayerInfo, TerrainGrid};
use super::layers::LayerCatalog;
use crate::error::ConfigError;

/// Tile rotation applied while stamping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Uniform draw over the four rotations
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Source index in the tile image for destination `(x, y)` within a tile
#[inline]
pub fn rotated_index(rotation: Rotation, x: usize, y: usize, tile_size: usize) -> usize {
    let last = tile_size - 1;
    match rotation {
        Rotation::Deg0 => y * tile_size + x,
        Rotation::Deg90 => y * tile_size + (last - x),
        Rotation::Deg180 => (last - y) * tile_size + (last - x),
        Rotation::Deg270 => (last - y) * tile_size + x,
    }
}

/// Depth row of the tile whose first grid row is `tile_y`.
///
/// Counted from the top of the world: the topmost full tile row is row 1.
/// Uses truncating division, so a clipped partial tile at the top also maps
/// to row 1. Results past the `i32` range saturate.
#[inline]
pub fn depth_row(height: usize, tile_y: usize, tile_size: usize) -> i32 {
    let (h, ty, ts) = (height as i64, tile_y as i64, tile_size.max(1) as i64);
    let row = (h - ty - ts) / ts + 1;
    row.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Weighted pick over `weights`, returning the chosen position.
///
/// Weights of zero or less count as 1, so an all-zero table is uniform.
/// `weights` must not be empty.
pub fn pick_weighted<R: Rng + ?Sized>(weights: &[f32], rng: &mut R) -> usize {
    let effective = |w: f32| if w > 0.0 { w } else { 1.0 };
    let total: f32 = weights.iter().copied().map(effective).sum();

    if !(total > 0.0) || !total.is_finite() {
        return rng.random_range(0..weights.len());
    }

    let r = rng.random_range(0.0..total);
    let mut sum = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        sum += effective(w);
        if sum >= r {
            return i;
        }
    }
    // Float rounding can leave r just past the last cumulative sum
    weights.len() - 1
}

/// What to place in rows no depth rule covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Always the first catalog layer
    #[default]
    DefaultLayer,
    /// Weighted pick using each layer's `selection_weight`
    CatalogWeights,
}

/// Generation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Generator {
    pub width: usize,
    pub height: usize,
    pub tile_size: usize,
    pub fallback: FallbackPolicy,
}

impl Generator {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        Self {
            width,
            height,
            tile_size,
            fallback: FallbackPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    fn validate(&self, catalog: &LayerCatalog) -> Result<(), ConfigError> {
        let max = i32::MAX as usize;
        if self.width == 0 || self.height == 0 || self.width > max || self.height > max {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.tile_size == 0 || self.tile_size > max {
            return Err(ConfigError::InvalidTileSize);
        }
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for layer in catalog.layers() {
            if layer.tile.width() != self.tile_size || layer.tile.height() != self.tile_size {
                return Err(ConfigError::TileSizeMismatch {
                    name: layer.name.clone(),
                    width: layer.tile.width(),
                    height: layer.tile.height(),
                    tile_size: self.tile_size,
                });
            }
        }
        Ok(())
    }

    /// Pick the catalog index for a tile at `row`
    fn select_layer<R: Rng + ?Sized>(&self, catalog: &LayerCatalog, row: i32, rng: &mut R) -> usize {
        if let Some(rule) = catalog.rule_for_row(row) {
            if !rule.entries.is_empty() {
                let weights: Vec<f32> = rule.entries.iter().map(|&(_, w)| w).collect();
                return rule.entries[pick_weighted(&weights, rng)].0;
            }
            return 0;
        }
        match self.fallback {
            FallbackPolicy::DefaultLayer => 0,
            FallbackPolicy::CatalogWeights => {
                let weights: Vec<f32> = catalog.layers().iter().map(|l| l.selection_weight).collect();
                pick_weighted(&weights, rng)
            }
        }
    }

    /// Build a fully solid grid from `catalog`
    pub fn generate<R: Rng + ?Sized>(
        &self,
        catalog: &LayerCatalog,
        rng: &mut R,
    ) -> Result<TerrainGrid, ConfigError> {
        self.validate(catalog)?;

        let (width, height, tile_size) = (self.width, self.height, self.tile_size);
        let mut grid = TerrainGrid::empty(width, height, layer_infos(catalog, height));
        let mut tiles = 0usize;

        for ty in (0..height).step_by(tile_size) {
            let row = depth_row(height, ty, tile_size);
            for tx in (0..width).step_by(tile_size) {
                let index = self.select_layer(catalog, row, rng);
                let layer = &catalog.layers()[index];
                let rotation = if layer.rotatable {
                    Rotation::random(rng)
                } else {
                    Rotation::Deg0
                };

                for y in 0..tile_size {
                    let gy = ty + y;
                    if gy >= height {
                        break;
                    }
                    for x in 0..tile_size {
                        let gx = tx + x;
                        if gx >= width {
                            break;
                        }
                        let color = layer.tile.sample(rotated_index(rotation, x, y, tile_size));
                        grid.fill_cell(gx, gy, index, color, layer.hardness);
                    }
                }
                tiles += 1;
            }
        }

        log::info!(
            "Generated {}x{} terrain: {} tiles of {}px, {} layers",
            width,
            height,
            tiles,
            tile_size,
            catalog.len()
        );
        Ok(grid)
    }
}

/// Generate with the default fallback policy
pub fn generate<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    catalog: &LayerCatalog,
    tile_size: usize,
    rng: &mut R,
) -> Result<TerrainGrid, ConfigError> {
    Generator::new(width, height, tile_size).generate(catalog, rng)
}

fn layer_infos(catalog: &LayerCatalog, height: usize) -> Vec<LayerInfo> {
    catalog
        .layers()
        .iter()
        .map(|def| LayerInfo {
            name: def.name.clone(),
            depth_start: 0.0,
            depth_end: height as f32,
            reward_value: def.reward_value,
            hardness: def.hardness,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Rgba8;
    use crate::sim::layers::{DepthRule, LayerDefinition, LayerWeight, TileImage};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn solid_layer(name: &str, tile_size: usize, shade: u8) -> LayerDefinition {
        LayerDefinition {
            name: name.to_string(),
            tile: TileImage::solid(tile_size, Rgba8::new(shade, shade, shade, 255)),
            hardness: 1.0,
            reward_value: 1,
            rotatable: false,
            selection_weight: 0.0,
        }
    }

    /// Tile whose pixel at index i has red = i
    fn indexed_layer(tile_size: usize, rotatable: bool) -> LayerDefinition {
        let pixels = (0..tile_size * tile_size)
            .map(|i| Rgba8::new(i as u8, 0, 0, 255))
            .collect();
        LayerDefinition {
            name: "Indexed".to_string(),
            tile: TileImage::new(tile_size, tile_size, pixels).unwrap(),
            hardness: 2.0,
            reward_value: 3,
            rotatable,
            selection_weight: 0.0,
        }
    }

    #[test]
    fn test_rotation_remap_is_bijection() {
        for tile_size in [1, 2, 5, 10] {
            for rotation in Rotation::ALL {
                let mut seen = vec![false; tile_size * tile_size];
                for y in 0..tile_size {
                    for x in 0..tile_size {
                        let i = rotated_index(rotation, x, y, tile_size);
                        assert!(!seen[i], "{rotation:?} visits {i} twice");
                        seen[i] = true;
                    }
                }
                assert!(seen.iter().all(|&s| s));
            }
        }
    }

    #[test]
    fn test_rotated_index_values() {
        assert_eq!(rotated_index(Rotation::Deg0, 1, 2, 4), 9);
        assert_eq!(rotated_index(Rotation::Deg90, 1, 2, 4), 10);
        assert_eq!(rotated_index(Rotation::Deg180, 1, 2, 4), 6);
        assert_eq!(rotated_index(Rotation::Deg270, 1, 2, 4), 5);
    }

    #[test]
    fn test_depth_row_mapping() {
        // 300 rows of 10px tiles: bottom tile row is depth 30, top is depth 1
        assert_eq!(depth_row(300, 0, 10), 30);
        assert_eq!(depth_row(300, 290, 10), 1);
        // Clipped top tile (rows 20..25 of a 25-row grid)
        assert_eq!(depth_row(25, 20, 10), 1);
        assert_eq!(depth_row(25, 10, 10), 2);
    }

    #[test]
    fn test_single_layer_fills_grid() {
        let catalog = LayerCatalog::new(vec![solid_layer("Soil", 3, 90)], Vec::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let grid = generate(10, 10, &catalog, 3, &mut rng).unwrap();

        assert_eq!(grid.live_cells(), 100);
        assert!(grid.layer_indices().iter().all(|&l| l == Some(0)));
        assert!(grid.durabilities().iter().all(|&d| d == 1.0));
        assert!(grid.check_invariants().is_ok());
        assert_eq!(grid.layer_infos()[0].depth_end, 10.0);
    }

    #[test]
    fn test_unrotated_tile_copied_verbatim() {
        let catalog = LayerCatalog::new(vec![indexed_layer(4, false)], Vec::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        let grid = generate(6, 6, &catalog, 4, &mut rng).unwrap();

        // First tile: identity copy
        assert_eq!(grid.color_at(1, 2).unwrap().r, 9);
        // Clipped tile at (4, 4): local (1, 1)
        assert_eq!(grid.color_at(5, 5).unwrap().r, 5);
        assert_eq!(grid.durability_at(5, 5), Some(2.0));
    }

    #[test]
    fn test_rotatable_tile_uses_one_rotation_per_tile() {
        let catalog = LayerCatalog::new(vec![indexed_layer(4, true)], Vec::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        let grid = generate(4, 4, &catalog, 4, &mut rng).unwrap();

        let matches_rotation = |rotation| {
            (0..4).all(|y| {
                (0..4).all(|x| {
                    grid.color_at(x, y).unwrap().r as usize == rotated_index(rotation, x, y, 4)
                })
            })
        };
        assert!(Rotation::ALL.into_iter().any(matches_rotation));
    }

    #[test]
    fn test_depth_rule_selects_layers() {
        let layers = vec![
            solid_layer("Soil", 2, 10),
            solid_layer("Stone", 2, 20),
        ];
        // 4 rows of 2px tiles: depth rows 4 (bottom) .. 1 (top)
        let rules = vec![DepthRule::new(3, 4, vec![LayerWeight::new("Stone", 1.0)])];
        let catalog = LayerCatalog::new(layers, rules).unwrap();
        let mut rng = Pcg32::seed_from_u64(5);
        let grid = generate(4, 8, &catalog, 2, &mut rng).unwrap();

        for x in 0..4 {
            assert_eq!(grid.layer_at(x, 0), Some(1));
            assert_eq!(grid.layer_at(x, 3), Some(1));
            assert_eq!(grid.layer_at(x, 4), Some(0));
            assert_eq!(grid.layer_at(x, 7), Some(0));
        }
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let layers = vec![solid_layer("Soil", 2, 10), solid_layer("Stone", 2, 20)];
        let rules = vec![DepthRule::new(
            1,
            100,
            vec![LayerWeight::new("Soil", 1.0), LayerWeight::new("Stone", 1.0)],
        )];
        let catalog = LayerCatalog::new(layers, rules).unwrap();

        let a = generate(20, 20, &catalog, 2, &mut Pcg32::seed_from_u64(42)).unwrap();
        let b = generate(20, 20, &catalog, 2, &mut Pcg32::seed_from_u64(42)).unwrap();
        assert_eq!(a.layer_indices(), b.layer_indices());
        assert_eq!(a.colors(), b.colors());
    }

    #[test]
    fn test_weighted_pick_calibration() {
        let weights = [1.0, 3.0, 6.0];
        let mut rng = Pcg32::seed_from_u64(2024);
        let mut counts = [0usize; 3];
        let n = 100_000;
        for _ in 0..n {
            counts[pick_weighted(&weights, &mut rng)] += 1;
        }
        for (i, &w) in weights.iter().enumerate() {
            let freq = counts[i] as f32 / n as f32;
            assert!((freq - w / 10.0).abs() < 0.01, "entry {i}: {freq}");
        }
    }

    #[test]
    fn test_zero_weights_are_uniform() {
        let weights = [0.0; 4];
        let mut rng = Pcg32::seed_from_u64(9);
        let mut counts = [0usize; 4];
        let n = 40_000;
        for _ in 0..n {
            counts[pick_weighted(&weights, &mut rng)] += 1;
        }
        for &c in &counts {
            assert!((c as f32 / n as f32 - 0.25).abs() < 0.01);
        }
    }

    #[test]
    fn test_catalog_weight_fallback() {
        let mut soil = solid_layer("Soil", 2, 10);
        soil.selection_weight = 0.000_001;
        let mut stone = solid_layer("Stone", 2, 20);
        stone.selection_weight = 1_000_000.0;
        let catalog = LayerCatalog::new(vec![soil, stone], Vec::new()).unwrap();

        let grid = Generator::new(8, 8, 2)
            .with_fallback(FallbackPolicy::CatalogWeights)
            .generate(&catalog, &mut Pcg32::seed_from_u64(11))
            .unwrap();
        assert!(grid.layer_indices().iter().all(|&l| l == Some(1)));
    }

    #[test]
    fn test_tile_size_mismatch_rejected() {
        let catalog = LayerCatalog::new(vec![solid_layer("Soil", 3, 10)], Vec::new()).unwrap();
        let err = generate(10, 10, &catalog, 4, &mut Pcg32::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, ConfigError::TileSizeMismatch { tile_size: 4, .. }));
    }

    #[test]
    fn test_bad_dimensions_rejected() {
        let catalog = LayerCatalog::new(vec![solid_layer("Soil", 2, 10)], Vec::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        assert!(matches!(
            generate(0, 10, &catalog, 2, &mut rng),
            Err(ConfigError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            generate(10, 10, &catalog, 0, &mut rng),
            Err(ConfigError::InvalidTileSize)
        ));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let catalog = LayerCatalog::new(vec![solid_layer("Soil", 2, 10)], Vec::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let huge = i32::MAX as usize + 1;
        assert!(matches!(
            generate(10, huge, &catalog, 2, &mut rng),
            Err(ConfigError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            generate(huge, 10, &catalog, 2, &mut rng),
            Err(ConfigError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_depth_row_large_heights_saturate() {
        let huge = i32::MAX as usize + 100;
        assert_eq!(depth_row(huge, 0, 1), i32::MAX);
        assert_eq!(depth_row(huge, huge - 10, 10), 1);
    }
}
