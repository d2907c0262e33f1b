use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::collision::Tilemap;
use crate::frames::FrameSet;
use crate::geometry::{Side, TileCoord};
use crate::player::Player;

use super::{EventContext, FrameContext, CHARACTER_FRAME_COUNT, DOOR_FRAME_COUNT};

pub(crate) fn door_frames() -> Arc<FrameSet> {
    Arc::new(FrameSet::numbered("doors/normal", DOOR_FRAME_COUNT).expect("door frames"))
}

pub(crate) fn character_frames() -> Arc<FrameSet> {
    Arc::new(FrameSet::numbered("npc/kid", CHARACTER_FRAME_COUNT).expect("character frames"))
}

/// Owns everything an [`EventContext`] borrows.
pub(crate) struct Harness {
    pub(crate) player: Player,
    pub(crate) map: Tilemap,
    pub(crate) frame: FrameContext,
    pub(crate) rng: StdRng,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            player: Player::new(TileCoord::new(0, 0), Side::Down),
            map: Tilemap::open(12, 12),
            frame: FrameContext::default(),
            rng: StdRng::seed_from_u64(7),
        }
    }

    pub(crate) fn ctx(&mut self) -> EventContext<'_> {
        EventContext {
            player: &mut self.player,
            collision: &self.map,
            frame: &mut self.frame,
            rng: &mut self.rng,
        }
    }
}
