use crate::collision::CollisionMap;
use crate::geometry::{Side, TileCoord, Vec2};
use crate::{STEP_PIXELS_PER_TICK, STEP_TICKS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepProgress {
    Idle,
    Moving,
    Arrived,
}

/// Tile position plus the sub-tile progress of the step in flight.
///
/// While no step is in flight the sub-tile offset is exactly zero. The tile
/// coordinate only changes when a step completes.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPosition {
    tile: TileCoord,
    facing: Side,
    animating: bool,
    locked: bool,
    offset_px: f32,
    step_ticks: u32,
}

impl GridPosition {
    pub fn new(tile: TileCoord, facing: Side) -> Self {
        Self {
            tile,
            facing,
            animating: false,
            locked: false,
            offset_px: 0.0,
            step_ticks: 0,
        }
    }

    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    pub fn facing(&self) -> Side {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Side) {
        self.facing = facing;
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock_move(&mut self) {
        self.locked = true;
    }

    pub fn unlock_move(&mut self) {
        self.locked = false;
    }

    /// Tile the step in flight ends on.
    pub fn destination(&self) -> Option<TileCoord> {
        self.animating.then(|| self.tile.neighbour(self.facing))
    }

    pub fn offset_px(&self) -> f32 {
        self.offset_px
    }

    /// Sub-tile offset as a pixel vector along the facing direction.
    pub fn offset_vector(&self) -> Vec2 {
        let (dx, dy) = self.facing.delta();
        Vec2 {
            x: dx as f32 * self.offset_px,
            y: dy as f32 * self.offset_px,
        }
    }

    /// Starts a step towards `direction`. `None` means "stay" and never moves.
    pub fn move_toward(&mut self, direction: Option<Side>, map: &dyn CollisionMap) -> bool {
        let Some(side) = direction else {
            return false;
        };
        if self.locked || self.animating || !map.is_passable(self.tile, side) {
            return false;
        }
        self.facing = side;
        self.animating = true;
        self.offset_px = 0.0;
        self.step_ticks = 0;
        true
    }

    /// Advances the step in flight by one tick. The seventh tick both moves
    /// and snaps onto the destination tile.
    pub fn advance_step(&mut self) -> StepProgress {
        if !self.animating {
            return StepProgress::Idle;
        }
        self.step_ticks += 1;
        self.offset_px += STEP_PIXELS_PER_TICK;
        if self.step_ticks >= STEP_TICKS {
            self.stop_move();
            return StepProgress::Arrived;
        }
        StepProgress::Moving
    }

    /// Finishes the step in flight. Refused until the full step has been travelled.
    pub fn stop_move(&mut self) -> bool {
        if !self.animating || self.step_ticks < STEP_TICKS {
            return false;
        }
        self.tile = self.tile.neighbour(self.facing);
        self.animating = false;
        self.offset_px = 0.0;
        self.step_ticks = 0;
        true
    }

    /// Drops any step in flight and puts the position on `tile`.
    pub fn place(&mut self, tile: TileCoord) {
        self.tile = tile;
        self.animating = false;
        self.offset_px = 0.0;
        self.step_ticks = 0;
    }
}
