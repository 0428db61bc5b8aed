//! Grid coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tiles per chunk side.
pub const CHUNK_SIZE: i64 = 10;

/// Total tiles in a filled chunk.
pub const TILES_PER_CHUNK: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Round `value` down to a multiple of [`CHUNK_SIZE`] (towards negative infinity).
///
/// Wraps at the ends of the `i64` range, so `base + relative` always gets
/// back to `value`.
pub fn floor_align(value: i64) -> i64 {
    value.wrapping_sub(value.rem_euclid(CHUNK_SIZE))
}

/// An absolute position on the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Base position of the chunk containing this position.
    pub fn chunk_base(self) -> Self {
        Self::new(floor_align(self.x), floor_align(self.y))
    }

    /// Position relative to the containing chunk's base.
    pub fn relative(self) -> TileKey {
        TileKey {
            x: self.x.rem_euclid(CHUNK_SIZE) as u32,
            y: self.y.rem_euclid(CHUNK_SIZE) as u32,
        }
    }

    /// Shifted position. Wraps at the ends of the `i64` range.
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }
}

impl From<(i64, i64)> for Position {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Key of a tile inside its chunk: the position modulo [`CHUNK_SIZE`].
///
/// Ordered x first, then y, which is also the chunk fill order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// Absolute position of this key inside the chunk based at `base`.
    pub fn absolute(self, base: Position) -> Position {
        base.offset(self.x as i64, self.y as i64)
    }

    /// Key of `position` inside the chunk based at `base`, measured as a
    /// wrapping offset. `None` if the position lies outside that chunk.
    pub fn within(base: Position, position: Position) -> Option<TileKey> {
        let dx = position.x.wrapping_sub(base.x) as u64;
        let dy = position.y.wrapping_sub(base.y) as u64;
        let size = CHUNK_SIZE as u64;
        (dx < size && dy < size).then(|| TileKey {
            x: dx as u32,
            y: dy as u32,
        })
    }

    /// Every key of a chunk in fill order.
    pub fn all() -> impl Iterator<Item = TileKey> {
        (0..CHUNK_SIZE as u32).flat_map(|x| (0..CHUNK_SIZE as u32).map(move |y| TileKey { x, y }))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.x, self.y)
    }
}
