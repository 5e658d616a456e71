//! Swept, axis-separated movement against the terrain grid
//!
//! A body is an axis-aligned box in grid-pixel space that covers columns
//! `floor(x) ..= ceil(x + width) - 1` and the matching rows. Movement is split
//! into sub-steps no longer than one pixel per axis; each sub-step resolves X
//! first, then Y, by testing every cell along the leading edge (both ends, the
//! middle and everything between) and snapping flush against a solid hit.
//!
//! Resolving X before Y makes a body landing exactly on a corner slide along
//! the floor instead of the wall.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::TerrainGrid;
use crate::consts::MAX_MOVE_SUBSTEPS;

/// An agent's bounding box, origin at its bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BodyRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Same size, moved to `pos`
    #[inline]
    pub fn at(&self, pos: Vec2) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            ..*self
        }
    }

    /// Bottom-centre point, where a falling digger bites
    #[inline]
    pub fn bottom_center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y)
    }

    /// Inclusive column range covered
    #[inline]
    pub fn columns(&self) -> (i32, i32) {
        covered(self.x, self.width)
    }

    /// Inclusive row range covered
    #[inline]
    pub fn rows(&self) -> (i32, i32) {
        covered(self.y, self.height)
    }

    /// Whether any covered cell is solid (including cells past the world edge)
    pub fn overlaps_solid(&self, grid: &TerrainGrid) -> bool {
        let (c0, c1) = self.columns();
        let (r0, r1) = self.rows();
        (r0..=r1).any(|r| (c0..=c1).any(|c| grid.is_solid(c, r)))
    }
}

/// First and last cell covered by the span `[start, start + len)`
#[inline]
fn covered(start: f32, len: f32) -> (i32, i32) {
    let first = start.floor() as i32;
    let last = ((start + len).ceil() as i32 - 1).max(first);
    (first, last)
}

/// Every cell across a span, so bodies wider than three pixels cannot slip
/// past a single solid pixel
#[inline]
fn edge_cells(start: f32, len: f32) -> std::ops::RangeInclusive<i32> {
    let (first, last) = covered(start, len);
    first..=last
}

/// Largest start whose span `[start, start + len)` ends at or before `edge`
#[inline]
fn flush_below(edge: i32, len: f32) -> f32 {
    let mut start = edge as f32 - len;
    while (start + len).ceil() as i32 > edge {
        start -= f32::EPSILON * start.abs().max(1.0);
    }
    start
}

/// Move `body` by `velocity` (pixels for this update), stopping at solid cells.
///
/// Returns the resolved position. Velocities longer than
/// [`MAX_MOVE_SUBSTEPS`] pixels are shortened to that length.
pub fn move_swept(grid: &TerrainGrid, body: &BodyRect, velocity: Vec2) -> Vec2 {
    move_swept_with_limit(grid, body, velocity, MAX_MOVE_SUBSTEPS)
}

/// [`move_swept`] with an explicit sub-step cap
pub fn move_swept_with_limit(
    grid: &TerrainGrid,
    body: &BodyRect,
    velocity: Vec2,
    max_substeps: u32,
) -> Vec2 {
    if !velocity.is_finite() || velocity == Vec2::ZERO {
        return body.position();
    }

    let max_substeps = max_substeps.max(1);
    let length = velocity.length();
    let wanted = length.ceil().max(1.0);

    // Each sub-step stays within one pixel per axis
    let (steps, mut step) = if wanted > max_substeps as f32 {
        log::debug!(
            "Clamping move of {:.1}px to {} sub-steps",
            length,
            max_substeps
        );
        (max_substeps, velocity / length)
    } else {
        let steps = wanted as u32;
        (steps, velocity / steps as f32)
    };

    let (w, h) = (body.width, body.height);
    let mut x = body.x;
    let mut y = body.y;

    for _ in 0..steps {
        if step.x != 0.0 {
            x += step.x;
            let (first, last) = covered(x, w);
            let col = if step.x > 0.0 { last } else { first };
            if edge_cells(y, h).any(|row| grid.is_solid(col, row)) {
                x = if step.x > 0.0 {
                    flush_below(col, w)
                } else {
                    col as f32 + 1.0
                };
                step.x = 0.0;
            }
        }

        if step.y != 0.0 {
            y += step.y;
            let (first, last) = covered(y, h);
            let row = if step.y > 0.0 { last } else { first };
            if edge_cells(x, w).any(|col| grid.is_solid(col, row)) {
                y = if step.y > 0.0 {
                    flush_below(row, h)
                } else {
                    row as f32 + 1.0
                };
                step.y = 0.0;
            }
        }

        if step == Vec2::ZERO {
            break;
        }
    }

    Vec2::new(x, y)
}
