//! Terrain grid: the authoritative pixel state
//!
//! Three parallel row-major arrays, one entry per pixel:
//! - `color`: visual sample, fully transparent when destroyed
//! - `layer`: index into the layer catalog, `None` when destroyed
//! - `durability`: remaining hardness, 0 when destroyed
//!
//! Row 0 is the bottom of the world; y grows upward.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color sample
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with full alpha
    pub const fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(c: Rgba8) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Axis-aligned pixel rectangle (inclusive origin, exclusive far edge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    /// Build from inclusive min/max cell coordinates
    pub fn from_bounds(min_x: usize, min_y: usize, max_x: usize, max_y: usize) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    /// Covers no cells
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Last column covered (inclusive). Meaningless for an empty rectangle.
    #[inline]
    pub fn max_x(&self) -> usize {
        (self.x + self.width).saturating_sub(1)
    }

    /// Last row covered (inclusive). Meaningless for an empty rectangle.
    #[inline]
    pub fn max_y(&self) -> usize {
        (self.y + self.height).saturating_sub(1)
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        !self.is_empty() && x >= self.x && x <= self.max_x() && y >= self.y && y <= self.max_y()
    }

    /// Smallest rectangle covering both; an empty side is ignored
    pub fn union(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Rect::from_bounds(
            self.x.min(other.x),
            self.y.min(other.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Per-layer summary derived once after generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    pub depth_start: f32,
    pub depth_end: f32,
    pub reward_value: u32,
    pub hardness: f32,
}

/// A cell that breaks the color/layer/durability agreement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvariantViolation {
    pub x: usize,
    pub y: usize,
}

/// The destructible pixel grid
#[derive(Debug, Clone, Serialize)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    pub(crate) color: Vec<Rgba8>,
    pub(crate) layer: Vec<Option<usize>>,
    pub(crate) durability: Vec<f32>,
    layers: Vec<LayerInfo>,
}

impl TerrainGrid {
    /// An all-empty grid (every cell destroyed)
    pub(crate) fn empty(width: usize, height: usize, layers: Vec<LayerInfo>) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            color: vec![Rgba8::TRANSPARENT; len],
            layer: vec![None; len],
            durability: vec![0.0; len],
            layers,
        }
    }

    /// Build a grid cell by cell.
    ///
    /// `cell` returns the layer index and color for a live cell, or `None` for
    /// an empty one. Durability comes from the layer's hardness. Indices past
    /// the end of `layers`, or naming a layer whose hardness is not positive
    /// and finite, are left empty.
    pub fn from_fn<F>(width: usize, height: usize, layers: Vec<LayerInfo>, mut cell: F) -> Self
    where
        F: FnMut(usize, usize) -> Option<(usize, Rgba8)>,
    {
        let mut grid = Self::empty(width, height, layers);
        for y in 0..height {
            for x in 0..width {
                if let Some((layer, color)) = cell(x, y) {
                    let Some(info) = grid.layers.get(layer) else {
                        continue;
                    };
                    let hardness = info.hardness;
                    if hardness > 0.0 && hardness.is_finite() {
                        grid.fill_cell(x, y, layer, color, hardness);
                    }
                }
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.color.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.color.is_empty()
    }

    /// Row-major index of an in-bounds cell
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Derived layer summaries, one per catalog entry
    pub fn layer_infos(&self) -> &[LayerInfo] {
        &self.layers
    }

    pub fn colors(&self) -> &[Rgba8] {
        &self.color
    }

    pub fn layer_indices(&self) -> &[Option<usize>] {
        &self.layer
    }

    pub fn durabilities(&self) -> &[f32] {
        &self.durability
    }

    /// Whole color buffer as raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.color)
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<Rgba8> {
        (x < self.width && y < self.height).then(|| self.color[self.index(x, y)])
    }

    pub fn layer_at(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            self.layer[self.index(x, y)]
        } else {
            None
        }
    }

    pub fn durability_at(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.durability[self.index(x, y)])
    }

    /// Movement-blocking test. Everything outside the grid is solid.
    #[inline]
    pub fn is_solid(&self, px: i32, py: i32) -> bool {
        if !self.in_bounds(px, py) {
            return true;
        }
        self.color[self.index(px as usize, py as usize)].a > 0
    }

    /// Number of cells not yet destroyed
    pub fn live_cells(&self) -> usize {
        self.layer.iter().filter(|l| l.is_some()).count()
    }

    /// Copy the colors under `rect` row by row (for a partial re-upload).
    ///
    /// The rectangle is clipped to the grid.
    pub fn region_pixels(&self, rect: &Rect) -> Vec<Rgba8> {
        if rect.x >= self.width || rect.y >= self.height || rect.width == 0 || rect.height == 0 {
            return Vec::new();
        }
        let max_x = rect.max_x().min(self.width - 1);
        let max_y = rect.max_y().min(self.height - 1);
        let row_len = max_x - rect.x + 1;

        let mut out = Vec::with_capacity(row_len * (max_y - rect.y + 1));
        for y in rect.y..=max_y {
            let start = self.index(rect.x, y);
            out.extend_from_slice(&self.color[start..start + row_len]);
        }
        out
    }

    /// Same as [`region_pixels`](Self::region_pixels), as raw RGBA bytes
    pub fn region_bytes(&self, rect: &Rect) -> Vec<u8> {
        bytemuck::cast_slice(&self.region_pixels(rect)).to_vec()
    }

    /// Check that color, layer and durability agree for every cell
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for i in 0..self.len() {
            let destroyed = self.durability[i] <= 0.0;
            let ok = match self.layer[i] {
                None => destroyed && self.color[i].a == 0,
                Some(l) => !destroyed && self.color[i].a > 0 && l < self.layers.len(),
            };
            if !ok || self.durability[i] < 0.0 {
                return Err(InvariantViolation {
                    x: i % self.width,
                    y: i / self.width,
                });
            }
        }
        Ok(())
    }

    /// Write a live cell. A fully transparent sample is made opaque so the
    /// cell still counts as solid.
    #[inline]
    pub(crate) fn fill_cell(&mut self, x: usize, y: usize, layer: usize, color: Rgba8, hardness: f32) {
        let i = self.index(x, y);
        self.color[i] = if color.a == 0 { color.opaque() } else { color };
        self.layer[i] = Some(layer);
        self.durability[i] = hardness;
    }

    #[inline]
    pub(crate) fn destroy_cell(&mut self, i: usize) {
        self.color[i] = Rgba8::TRANSPARENT;
        self.layer[i] = None;
        self.durability[i] = 0.0;
    }
}
