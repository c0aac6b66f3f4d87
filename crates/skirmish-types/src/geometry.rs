//! Grid geometry: positions, displacements, and the bounded playing field.
//!
//! All distance checks in the simulation use the squared Euclidean metric
//! computed here, so moves, detection, and tests agree on what "in range"
//! means. Coordinates are unsigned and always lie inside `[0, width) ×
//! [0, height)`; every move goes through [`Bounds::apply`], which clamps
//! rather than wraps.

use serde::{Deserialize, Serialize};

/// A cell on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column, `0..width`.
    pub x: u32,
    /// Row, `0..height`.
    pub y: u32,
}

impl Position {
    /// Create a position from raw coordinates.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    pub fn squared_distance(self, other: Self) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Whether `other` lies within `range` cells (inclusive).
    pub fn is_within(self, other: Self, range: u32) -> bool {
        let r = u64::from(range);
        self.squared_distance(other) <= r.saturating_mul(r)
    }

    /// Pack both coordinates into one word so they can be stored atomically.
    pub const fn pack(self) -> u64 {
        let [x0, x1, x2, x3] = self.x.to_be_bytes();
        let [y0, y1, y2, y3] = self.y.to_be_bytes();
        u64::from_be_bytes([x0, x1, x2, x3, y0, y1, y2, y3])
    }

    /// Inverse of [`Position::pack`].
    pub const fn unpack(word: u64) -> Self {
        let [x0, x1, x2, x3, y0, y1, y2, y3] = word.to_be_bytes();
        Self {
            x: u32::from_be_bytes([x0, x1, x2, x3]),
            y: u32::from_be_bytes([y0, y1, y2, y3]),
        }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A signed step applied to a position during the move phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Displacement {
    /// Horizontal component.
    pub dx: i32,
    /// Vertical component.
    pub dy: i32,
}

impl Displacement {
    /// Create a displacement from its components.
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// The extent of the playing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Number of columns; valid `x` values are `0..width`.
    pub width: u32,
    /// Number of rows; valid `y` values are `0..height`.
    pub height: u32,
}

impl Bounds {
    /// Create bounds for a `width × height` field.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `pos` lies inside the field.
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Clamp an arbitrary position into the field.
    pub fn clamp(&self, pos: Position) -> Position {
        Position {
            x: pos.x.min(self.width.saturating_sub(1)),
            y: pos.y.min(self.height.saturating_sub(1)),
        }
    }

    /// Apply `step` to `pos`, clamping each axis to the field.
    ///
    /// The result is inside the field for any displacement magnitude. A
    /// degenerate field (zero width or height) pins that axis to 0.
    pub fn apply(&self, pos: Position, step: Displacement) -> Position {
        Position {
            x: clamp_axis(pos.x, step.dx, self.width),
            y: clamp_axis(pos.y, step.dy, self.height),
        }
    }
}

/// Move one coordinate by `delta`, clamped to `0..extent`.
fn clamp_axis(coord: u32, delta: i32, extent: u32) -> u32 {
    let max = i64::from(extent.saturating_sub(1));
    let target = i64::from(coord).saturating_add(i64::from(delta)).clamp(0, max);
    u32::try_from(target).unwrap_or(0)
}
