use rand::RngCore;

use crate::collision::CollisionMap;
use crate::geometry::{Side, TileCoord};
use crate::player::Player;

use super::EventId;

/// Work an event hands back to the overworld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverworldRequest {
    Teleport {
        map: String,
        tile: TileCoord,
        facing: Option<Side>,
    },
    StartDialogue {
        source: EventId,
        lines: Vec<String>,
    },
    PlaySound {
        cue: String,
    },
    DeclareBattle {
        trainer: EventId,
    },
    SpotPlayer {
        trainer: EventId,
    },
}

/// Per-frame state owned by the overworld and reset at the start of every frame.
#[derive(Debug, Default)]
pub struct FrameContext {
    teleported: bool,
    requests: Vec<OverworldRequest>,
}

impl FrameContext {
    pub fn begin_frame(&mut self) {
        self.teleported = false;
        self.requests.clear();
    }

    /// True once any event teleported the player during this frame.
    pub fn just_teleported(&self) -> bool {
        self.teleported
    }

    pub(crate) fn mark_teleported(&mut self) {
        self.teleported = true;
    }

    pub fn request(&mut self, request: OverworldRequest) {
        self.requests.push(request);
    }

    pub fn drain_requests(&mut self) -> Vec<OverworldRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn pending_requests(&self) -> &[OverworldRequest] {
        &self.requests
    }
}

/// Everything an event may touch while reacting to a trigger or a frame tick.
pub struct EventContext<'a> {
    pub player: &'a mut Player,
    pub collision: &'a dyn CollisionMap,
    pub frame: &'a mut FrameContext,
    pub rng: &'a mut dyn RngCore,
}
