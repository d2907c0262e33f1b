use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::geometry::Side;
use crate::grid::StepProgress;

use super::{Dialogue, EventBase, EventContext, EventError, EventId};

/// Resting, first walk phase and second walk phase, four facings each.
pub const CHARACTER_FRAME_COUNT: usize = 12;
const WALK_FRAMES_OFFSET: usize = 4;
const WALK_ALT_FRAMES_OFFSET: usize = 8;
/// Ticks spent on the first walk frame before switching to the second.
const WALK_FIRST_PHASE_TICKS: u32 = 8;
/// Ticks after which the walk cycle starts over.
const WALK_CYCLE_TICKS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStyle {
    Stationary,
    Random,
    Scripted,
    /// Not implemented: characters with this style stand still.
    Follow,
}

/// Self-driven movement and walk animation for character-like events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    style: MoveStyle,
    path: Vec<Side>,
    path_index: usize,
    walk_ticks: u32,
    second_phase: bool,
}

impl Character {
    pub fn new(style: MoveStyle, path: Vec<Side>) -> Result<Self, EventError> {
        if style == MoveStyle::Scripted && path.is_empty() {
            return Err(EventError::EmptyScriptedPath);
        }
        Ok(Self {
            style,
            path,
            path_index: 0,
            walk_ticks: 0,
            second_phase: false,
        })
    }

    pub fn stationary() -> Self {
        Self {
            style: MoveStyle::Stationary,
            path: Vec::new(),
            path_index: 0,
            walk_ticks: 0,
            second_phase: false,
        }
    }

    pub fn style(&self) -> MoveStyle {
        self.style
    }

    pub fn path(&self) -> &[Side] {
        &self.path
    }

    /// Index of the scripted step tried next.
    pub fn path_index(&self) -> usize {
        self.path_index
    }

    /// Starts one step outside the movement style.
    pub fn walk(&mut self, side: Side, base: &mut EventBase, ctx: &mut EventContext<'_>) -> bool {
        base.position_mut().move_toward(Some(side), ctx.collision)
    }

    pub(crate) fn update(&mut self, base: &mut EventBase, ctx: &mut EventContext<'_>) {
        if !base.position().is_animating() {
            match self.style {
                MoveStyle::Stationary | MoveStyle::Follow => {}
                MoveStyle::Scripted => self.step_scripted(base, ctx),
                MoveStyle::Random => self.step_random(base, ctx),
            }
        }
        self.select_walk_frame(base);
        if base.position_mut().advance_step() == StepProgress::Arrived {
            base.update_texture();
        }
    }

    fn step_scripted(&mut self, base: &mut EventBase, ctx: &mut EventContext<'_>) {
        let Some(side) = self.path.get(self.path_index).copied() else {
            self.path_index = 0;
            return;
        };
        // A blocked step is retried on the next idle tick.
        if base.position_mut().move_toward(Some(side), ctx.collision) {
            self.path_index = (self.path_index + 1) % self.path.len();
        }
    }

    fn step_random(&mut self, base: &mut EventBase, ctx: &mut EventContext<'_>) {
        let direction = match ctx.rng.gen_range(0..5u32) {
            0 => None,
            1 => Some(Side::Up),
            2 => Some(Side::Down),
            3 => Some(Side::Left),
            4 => Some(Side::Right),
            draw => {
                error!(draw, "random_move_out_of_range");
                None
            }
        };
        base.position_mut().move_toward(direction, ctx.collision);
    }

    fn select_walk_frame(&mut self, base: &mut EventBase) {
        let facing = base.position().facing().frame_index();
        if !base.position().is_animating() {
            base.select_frame(facing);
        } else if !self.second_phase {
            base.select_frame(WALK_FRAMES_OFFSET + facing);
            self.walk_ticks += 1;
            self.second_phase = self.walk_ticks > WALK_FIRST_PHASE_TICKS;
        } else {
            base.select_frame(WALK_ALT_FRAMES_OFFSET + facing);
            self.walk_ticks += 1;
            if self.walk_ticks > WALK_CYCLE_TICKS {
                self.second_phase = false;
                self.walk_ticks = 0;
            }
        }
    }
}

/// Character that turns to the player and talks once its current step ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkingCharacter {
    character: Character,
    dialogue: Dialogue,
    conversing: bool,
}

impl TalkingCharacter {
    pub fn new(character: Character, dialogue: Dialogue) -> Self {
        Self {
            character,
            dialogue,
            conversing: false,
        }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    pub fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    pub fn dialogue_mut(&mut self) -> &mut Dialogue {
        &mut self.dialogue
    }

    pub fn is_conversing(&self) -> bool {
        self.conversing
    }

    pub(crate) fn action(&mut self, base: &mut EventBase) {
        base.position_mut().lock_move();
        self.conversing = true;
    }

    pub(crate) fn update(&mut self, id: EventId, base: &mut EventBase, ctx: &mut EventContext<'_>) {
        self.character.update(base, ctx);
        if !self.conversing || base.position().is_animating() {
            return;
        }
        let facing = ctx.player.facing().opposite();
        base.position_mut().set_facing(facing);
        base.select_frame(facing.frame_index());
        base.update_texture();
        base.position_mut().unlock_move();
        self.conversing = false;
        self.dialogue.start(id, ctx);
    }
}
