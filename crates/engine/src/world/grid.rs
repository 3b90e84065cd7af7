use thiserror::Error;

use super::geometry::{TileCoord, Vec2};

pub const DEFAULT_TILE_SIZE: f32 = 32.0;

/// Pre-parsed collision description handed over by the map loader.
pub trait CollisionSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn is_blocked(&self, x: u32, y: u32) -> bool;
}

/// Dense collision layer: `true` cells are blocked, rows are stored top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionLayer {
    width: u32,
    height: u32,
    blocked: Vec<bool>,
}

impl CollisionLayer {
    pub fn new(width: u32, height: u32, blocked: Vec<bool>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        if blocked.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: blocked.len(),
            });
        }
        Ok(Self {
            width,
            height,
            blocked,
        })
    }

    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            blocked: vec![false; width as usize * height as usize],
        }
    }

    /// Parses rows where `#` marks a blocked cell and anything else is open.
    pub fn from_rows(rows: &[&str]) -> Result<Self, GridError> {
        let height = rows.len() as u32;
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0) as u32;
        let mut blocked = Vec::with_capacity(width as usize * height as usize);
        for (row_index, row) in rows.iter().enumerate() {
            let row_width = row.chars().count() as u32;
            if row_width != width {
                return Err(GridError::RaggedRow {
                    row: row_index,
                    expected: width,
                    actual: row_width,
                });
            }
            blocked.extend(row.chars().map(|cell| cell == '#'));
        }
        Self::new(width, height, blocked)
    }

    pub fn set_blocked(&mut self, x: u32, y: u32, blocked: bool) {
        if x < self.width && y < self.height {
            let index = y as usize * self.width as usize + x as usize;
            self.blocked[index] = blocked;
        }
    }
}

impl CollisionSource for CollisionLayer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn is_blocked(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return true;
        }
        self.blocked[y as usize * self.width as usize + x as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("room has no collision source")]
    NoCollisionSource,
    #[error("collision cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("collision row {row} has width {actual}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: u32,
        actual: u32,
    },
    #[error(
        "collision layer {layer} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}"
    )]
    LayerSizeMismatch {
        layer: usize,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("tile size must be finite and > 0, got {0}")]
    InvalidTileSize(f32),
}

/// Immutable per-room walkability matrix.
///
/// Tile (x,y) covers world `[x * tile_size, (x + 1) * tile_size)` on each axis,
/// its center is `(x + 0.5) * tile_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: f32,
    blocked: Vec<bool>,
}

impl TileGrid {
    pub fn from_layers(layers: &[&dyn CollisionSource], tile_size: f32) -> Result<Self, GridError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(GridError::InvalidTileSize(tile_size));
        }
        let Some(first) = layers.first() else {
            return Err(GridError::NoCollisionSource);
        };
        let width = first.width();
        let height = first.height();
        for (layer, source) in layers.iter().enumerate().skip(1) {
            if source.width() != width || source.height() != height {
                return Err(GridError::LayerSizeMismatch {
                    layer,
                    expected_width: width,
                    expected_height: height,
                    actual_width: source.width(),
                    actual_height: source.height(),
                });
            }
        }

        let mut blocked = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                blocked.push(layers.iter().any(|source| source.is_blocked(x, y)));
            }
        }

        Ok(Self {
            width,
            height,
            tile_size,
            blocked,
        })
    }

    pub fn from_source(source: &dyn CollisionSource) -> Result<Self, GridError> {
        Self::from_layers(&[source], DEFAULT_TILE_SIZE)
    }

    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tile_size: DEFAULT_TILE_SIZE,
            blocked: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.x < self.width && tile.y < self.height
    }

    pub fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if !self.in_bounds(tile) {
            return None;
        }
        Some(tile.y as usize * self.width as usize + tile.x as usize)
    }

    /// Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, tile: TileCoord) -> bool {
        self.index_of(tile)
            .and_then(|index| self.blocked.get(index))
            .copied()
            .unwrap_or(true)
    }

    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        !self.is_blocked(tile)
    }

    pub fn world_to_tile(&self, world: Vec2) -> Option<TileCoord> {
        let tile_x = (world.x / self.tile_size).floor();
        let tile_y = (world.y / self.tile_size).floor();
        if tile_x < 0.0 || tile_y < 0.0 {
            return None;
        }
        let tile = TileCoord {
            x: tile_x as u32,
            y: tile_y as u32,
        };
        self.in_bounds(tile).then_some(tile)
    }

    pub fn tile_center_world(&self, tile: TileCoord) -> Vec2 {
        Vec2 {
            x: (tile.x as f32 + 0.5) * self.tile_size,
            y: (tile.y as f32 + 0.5) * self.tile_size,
        }
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2 {
            x: self.width as f32 * self.tile_size,
            y: self.height as f32 * self.tile_size,
        }
    }

    /// Up, down, left, right. The order is part of the route determinism contract.
    pub(crate) fn neighbors(&self, tile: TileCoord) -> [Option<TileCoord>; 4] {
        let up = (tile.y > 0).then(|| TileCoord::new(tile.x, tile.y - 1));
        let down = (tile.y + 1 < self.height).then(|| TileCoord::new(tile.x, tile.y + 1));
        let left = (tile.x > 0).then(|| TileCoord::new(tile.x - 1, tile.y));
        let right = (tile.x + 1 < self.width).then(|| TileCoord::new(tile.x + 1, tile.y));
        [up, down, left, right]
    }
}
