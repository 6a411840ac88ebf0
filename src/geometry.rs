//! Tile coordinates, neighbourhoods and the isometric display plane.
//!
//! Grid positions are signed so that callers can hand in unresolved
//! coordinates (for example a pointer that fell off the map) and have them
//! rejected by bounds checks instead of wrapping.

use serde::{Deserialize, Serialize};

pub const TILE_WIDTH: f64 = 100.0;
pub const TILE_HEIGHT: f64 = TILE_WIDTH / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A point on the continuous display plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: ScreenPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves at most `step` units along the straight line to `target`,
    /// stopping on it rather than overshooting.
    pub fn move_towards(self, target: ScreenPoint, step: f64) -> ScreenPoint {
        let dist = self.distance_to(target);
        if dist <= step || dist <= f64::EPSILON {
            return target;
        }
        let scale = step.max(0.0) / dist;
        ScreenPoint::new(
            self.x + (target.x - self.x) * scale,
            self.y + (target.y - self.y) * scale,
        )
    }
}

/// Square (Chebyshev) neighbourhood of `pos`, clipped to a `width` x `height`
/// grid, excluding `pos` itself. Row-major order.
pub fn neighbors(pos: TilePos, radius: u32, width: usize, height: usize) -> Vec<TilePos> {
    let range = radius as i32;
    let mut results = Vec::with_capacity(((2 * range + 1) * (2 * range + 1)) as usize);
    for dy in -range..=range {
        for dx in -range..=range {
            if dx == 0 && dy == 0 {
                continue;
            }
            let candidate = pos.offset(dx, dy);
            if in_bounds(candidate, width, height) {
                results.push(candidate);
            }
        }
    }
    results
}

pub fn in_bounds(pos: TilePos, width: usize, height: usize) -> bool {
    pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < width && (pos.y as usize) < height
}

/// Projects a grid coordinate onto the display plane (top vertex of the tile).
pub fn iso_to_screen(pos: TilePos) -> ScreenPoint {
    let x = f64::from(pos.x);
    let y = f64::from(pos.y);
    ScreenPoint::new((x - y) * TILE_WIDTH / 2.0, (x + y) * TILE_HEIGHT / 2.0)
}

/// Visual centre of a tile's diamond.
pub fn tile_center(pos: TilePos) -> ScreenPoint {
    let top = iso_to_screen(pos);
    ScreenPoint::new(top.x, top.y + TILE_HEIGHT / 2.0)
}

/// Inverse of [`iso_to_screen`], rounded to the nearest tile. This is the one
/// place that decides which tile a display point belongs to.
pub fn screen_to_iso(point: ScreenPoint) -> TilePos {
    let u = point.x / (TILE_WIDTH / 2.0);
    let v = point.y / (TILE_HEIGHT / 2.0);
    TilePos::new(round_half_up((u + v) / 2.0), round_half_up((v - u) / 2.0))
}

/// Tile whose diamond centre is nearest to `point`. Use this for agents,
/// which travel between tile centres rather than projection vertices.
pub fn tile_under(point: ScreenPoint) -> TilePos {
    screen_to_iso(ScreenPoint::new(point.x, point.y - TILE_HEIGHT / 2.0))
}

fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
