use serde::{Deserialize, Serialize};

use crate::TILE_SIZE_PX;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        self.offset(rhs.x, rhs.y)
    }
}

/// Map grid coordinate. Signed so off-map neighbours stay representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn neighbour(self, side: Side) -> Self {
        let (dx, dy) = side.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Top-left pixel of the tile.
    pub fn to_pixels(self) -> Vec2 {
        Vec2 {
            x: self.x as f32 * TILE_SIZE_PX,
            y: self.y as f32 * TILE_SIZE_PX,
        }
    }

    /// Side of `self` on which `other` sits, when the two are orthogonal neighbours.
    pub fn side_towards(self, other: TileCoord) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| self.neighbour(*side) == other)
    }
}

/// Facing and stepping direction. "No direction" is `Option<Side>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Up,
    Down,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Up, Side::Down, Side::Left, Side::Right];

    /// Tile delta in screen space (y grows downwards).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Position of this direction inside a four-entry block of a character frame set.
    pub fn frame_index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    fn bit(self) -> u8 {
        1 << self.frame_index()
    }
}

/// Set of entity sides the player may stand on to trigger it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Side>", into = "Vec<Side>")]
pub struct SideMask(u8);

impl SideMask {
    pub const NONE: SideMask = SideMask(0);
    pub const UP: SideMask = SideMask(1);
    pub const DOWN: SideMask = SideMask(1 << 1);
    pub const LEFT: SideMask = SideMask(1 << 2);
    pub const RIGHT: SideMask = SideMask(1 << 3);
    pub const ALL: SideMask = SideMask(0b1111);

    pub fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn with(self, side: Side) -> SideMask {
        SideMask(self.0 | side.bit())
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for SideMask {
    type Output = SideMask;

    fn bitor(self, rhs: SideMask) -> SideMask {
        SideMask(self.0 | rhs.0)
    }
}

impl From<Side> for SideMask {
    fn from(side: Side) -> Self {
        SideMask(side.bit())
    }
}

impl From<Vec<Side>> for SideMask {
    fn from(sides: Vec<Side>) -> Self {
        sides
            .into_iter()
            .fold(SideMask::NONE, |mask, side| mask.with(side))
    }
}

impl From<SideMask> for Vec<Side> {
    fn from(mask: SideMask) -> Self {
        Side::ALL
            .into_iter()
            .filter(|side| mask.contains(*side))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbour_follows_screen_axes() {
        let origin = TileCoord::new(5, 5);
        assert_eq!(origin.neighbour(Side::Up), TileCoord::new(5, 4));
        assert_eq!(origin.neighbour(Side::Down), TileCoord::new(5, 6));
        assert_eq!(origin.neighbour(Side::Left), TileCoord::new(4, 5));
        assert_eq!(origin.neighbour(Side::Right), TileCoord::new(6, 5));
    }

    #[test]
    fn side_towards_is_inverse_of_neighbour() {
        let origin = TileCoord::new(2, 3);
        for side in Side::ALL {
            assert_eq!(origin.side_towards(origin.neighbour(side)), Some(side));
        }
        assert_eq!(origin.side_towards(TileCoord::new(4, 3)), None);
    }

    #[test]
    fn side_mask_membership() {
        let mask = SideMask::UP | SideMask::LEFT;
        assert!(mask.contains(Side::Up));
        assert!(mask.contains(Side::Left));
        assert!(!mask.contains(Side::Down));
        assert!(SideMask::NONE.is_empty());
        assert!(Side::ALL.iter().all(|side| SideMask::ALL.contains(*side)));
    }

    #[test]
    fn side_mask_decodes_from_side_list() {
        let mask: SideMask = serde_json::from_str(r#"["down", "right"]"#).expect("mask");
        assert_eq!(mask, SideMask::DOWN | SideMask::RIGHT);
    }
}
