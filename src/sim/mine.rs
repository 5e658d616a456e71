//! Mining: radius-bounded durability damage
//!
//! A mine call damages every live cell inside a circle, destroys the ones whose
//! durability reaches zero, and reports the reward earned plus the tight
//! bounding box of destroyed cells so the caller can refresh just that region.

use serde::{Deserialize, Serialize};

use super::grid::{Rect, TerrainGrid};

/// A single mining command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MineRequest {
    pub center_x: i32,
    pub center_y: i32,
    /// Circle radius in pixels (values below 1 act as 1)
    pub radius: i32,
    /// Durability removed from each cell
    pub power: f32,
}

impl MineRequest {
    pub fn new(center_x: i32, center_y: i32, radius: i32, power: f32) -> Self {
        Self {
            center_x,
            center_y,
            radius,
            power,
        }
    }
}

/// Outcome of a mining command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MineResult {
    /// Sum of reward values of the cells destroyed by this call
    pub reward: u32,
    /// Bounds of the destroyed cells, `None` if nothing was destroyed
    pub dirty: Option<Rect>,
}

impl MineResult {
    /// Whether the call destroyed anything
    pub fn changed(&self) -> bool {
        self.dirty.is_some()
    }
}

/// Apply a mining command to the grid
pub fn mine(grid: &mut TerrainGrid, request: &MineRequest) -> MineResult {
    let power = request.power;
    if !(power > 0.0) || !power.is_finite() {
        return MineResult::default();
    }

    let radius = request.radius.max(1);
    let radius_sq = radius as i64 * radius as i64;
    let (cx, cy) = (request.center_x, request.center_y);

    // Clip the bounding square to the grid
    let min_x = (cx as i64 - radius as i64).max(0);
    let max_x = (cx as i64 + radius as i64).min(grid.width() as i64 - 1);
    let min_y = (cy as i64 - radius as i64).max(0);
    let max_y = (cy as i64 + radius as i64).min(grid.height() as i64 - 1);

    let mut reward = 0u32;
    let mut bounds: Option<(usize, usize, usize, usize)> = None;

    for y in min_y..=max_y {
        let dy = y - cy as i64;
        for x in min_x..=max_x {
            let dx = x - cx as i64;
            if dx * dx + dy * dy > radius_sq {
                continue;
            }

            let (ux, uy) = (x as usize, y as usize);
            let i = grid.index(ux, uy);
            let Some(layer) = grid.layer[i] else {
                continue;
            };
            let Some(info) = grid.layer_infos().get(layer) else {
                continue;
            };
            if grid.durability[i] <= 0.0 {
                continue;
            }
            let reward_value = info.reward_value;

            grid.durability[i] = (grid.durability[i] - power).max(0.0);
            if grid.durability[i] > 0.0 {
                continue;
            }

            grid.destroy_cell(i);
            reward = reward.saturating_add(reward_value);
            bounds = Some(match bounds {
                None => (ux, uy, ux, uy),
                Some((x0, y0, x1, y1)) => (x0.min(ux), y0.min(uy), x1.max(ux), y1.max(uy)),
            });
        }
    }

    let dirty = bounds.map(|(x0, y0, x1, y1)| Rect::from_bounds(x0, y0, x1, y1));
    if let Some(rect) = dirty {
        log::debug!(
            "Mined at ({}, {}) r={}: reward {}, dirty {}x{} at ({}, {})",
            cx,
            cy,
            radius,
            reward,
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
    }

    MineResult { reward, dirty }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::{LayerInfo, Rgba8};

    fn layers() -> Vec<LayerInfo> {
        vec![
            LayerInfo {
                name: "Soil".to_string(),
                depth_start: 0.0,
                depth_end: 10.0,
                reward_value: 1,
                hardness: 1.0,
            },
            LayerInfo {
                name: "Ore".to_string(),
                depth_start: 0.0,
                depth_end: 10.0,
                reward_value: 5,
                hardness: 2.5,
            },
        ]
    }

    fn solid(width: usize, height: usize, layer: usize) -> TerrainGrid {
        TerrainGrid::from_fn(width, height, layers(), |_, _| {
            Some((layer, Rgba8::new(139, 69, 19, 255)))
        })
    }

    #[test]
    fn test_mine_radius_one_disk() {
        let mut grid = solid(10, 10, 0);
        let result = mine(&mut grid, &MineRequest::new(5, 5, 1, 1.0));

        assert_eq!(result.reward, 5);
        assert_eq!(result.dirty, Some(Rect::from_bounds(4, 4, 6, 6)));
        assert_eq!(grid.live_cells(), 95);
        for (x, y) in [(5, 5), (4, 5), (6, 5), (5, 4), (5, 6)] {
            assert_eq!(grid.layer_at(x, y), None);
            assert!(!grid.is_solid(x as i32, y as i32));
        }
        // Diagonals are outside the circle
        assert_eq!(grid.layer_at(4, 4), Some(0));
        assert!(grid.check_invariants().is_ok());
    }

    #[test]
    fn test_mine_twice_is_noop() {
        let mut grid = solid(10, 10, 0);
        let request = MineRequest::new(5, 5, 2, 1.0);
        let first = mine(&mut grid, &request);
        assert!(first.changed());

        let second = mine(&mut grid, &request);
        assert_eq!(second, MineResult::default());
    }

    #[test]
    fn test_hard_cells_take_several_hits() {
        let mut grid = solid(5, 5, 1);
        let request = MineRequest::new(2, 2, 1, 1.0);

        let first = mine(&mut grid, &request);
        assert_eq!(first, MineResult::default());
        assert_eq!(grid.durability_at(2, 2), Some(1.5));

        let second = mine(&mut grid, &request);
        assert_eq!(second.reward, 0);
        assert_eq!(grid.durability_at(2, 2), Some(0.5));

        let third = mine(&mut grid, &request);
        assert_eq!(third.reward, 25);
        assert_eq!(grid.durability_at(2, 2), Some(0.0));
        assert!(grid.check_invariants().is_ok());
    }

    #[test]
    fn test_mine_clipped_at_corner() {
        let mut grid = solid(4, 4, 0);
        let result = mine(&mut grid, &MineRequest::new(0, 0, 1, 5.0));

        assert_eq!(result.reward, 3);
        assert_eq!(result.dirty, Some(Rect::from_bounds(0, 0, 1, 1)));
    }

    #[test]
    fn test_mine_outside_grid_is_noop() {
        let mut grid = solid(4, 4, 0);
        let result = mine(&mut grid, &MineRequest::new(-10, 40, 3, 1.0));
        assert_eq!(result, MineResult::default());
        assert_eq!(grid.live_cells(), 16);
    }

    #[test]
    fn test_zero_radius_acts_as_one() {
        let mut grid = solid(5, 5, 0);
        let result = mine(&mut grid, &MineRequest::new(2, 2, 0, 1.0));
        assert_eq!(result.reward, 5);
    }

    #[test]
    fn test_non_positive_power_is_noop() {
        let mut grid = solid(5, 5, 0);
        for power in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert_eq!(
                mine(&mut grid, &MineRequest::new(2, 2, 2, power)),
                MineResult::default()
            );
        }
        assert_eq!(grid.durability_at(2, 2), Some(1.0));
    }

    #[test]
    fn test_dirty_rect_tracks_only_destroyed_cells() {
        // Left half soft, right half hard
        let mut grid = TerrainGrid::from_fn(6, 3, layers(), |x, _| {
            Some((if x < 3 { 0 } else { 1 }, Rgba8::new(1, 1, 1, 255)))
        });
        let result = mine(&mut grid, &MineRequest::new(3, 1, 2, 1.0));

        let dirty = result.dirty.unwrap();
        assert!(dirty.max_x() <= 2);
        assert_eq!(grid.durability_at(3, 1), Some(1.5));
    }
}
