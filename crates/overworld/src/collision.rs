use thiserror::Error;

use crate::geometry::{Side, TileCoord};

/// Tile id that blocks movement.
pub const BLOCKED_TILE_ID: u16 = 2;

/// Collision surface consulted before a step begins.
pub trait CollisionMap {
    /// Whether the neighbour of `from` towards `side` can be entered.
    fn is_passable(&self, from: TileCoord, side: Side) -> bool;
}

/// Row-major grid of tile ids. Tile (0,0) is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

impl Tilemap {
    pub fn new(width: u32, height: u32, tiles: Vec<u16>) -> Result<Self, TilemapError> {
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if tile.x < 0 || tile.y < 0 {
            return None;
        }
        let (x, y) = (tile.x as u32, tile.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, tile: TileCoord) -> Option<u16> {
        self.index_of(tile)
            .and_then(|index| self.tiles.get(index).copied())
    }

    pub fn set_tile(&mut self, tile: TileCoord, tile_id: u16) -> bool {
        let Some(index) = self.index_of(tile) else {
            return false;
        };
        self.tiles[index] = tile_id;
        true
    }

    /// Off-map tiles are never walkable.
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.tile_at(tile)
            .is_some_and(|tile_id| tile_id != BLOCKED_TILE_ID)
    }
}

impl CollisionMap for Tilemap {
    fn is_passable(&self, from: TileCoord, side: Side) -> bool {
        self.is_walkable(from.neighbour(side))
    }
}
