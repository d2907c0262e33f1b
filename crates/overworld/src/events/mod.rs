//! Map objects the overworld triggers and ticks.
//!
//! Every object is one [`Event`]: a shared [`EventBase`] (position, frames,
//! trigger rules, sprite) plus an [`EventKind`] naming which capabilities it
//! carries. Capabilities never hold their own copy of position or frame state;
//! they receive the base by reference on every call.

mod character;
mod context;
mod dialogue;
mod door;
mod trainer;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frames::{FrameCursor, FrameSet, Sprite};
use crate::geometry::{Side, SideMask, TileCoord, Vec2};
use crate::grid::GridPosition;
use crate::lang::Localizer;

pub use character::{Character, MoveStyle, TalkingCharacter, CHARACTER_FRAME_COUNT};
pub use context::{EventContext, FrameContext, OverworldRequest};
pub use dialogue::Dialogue;
pub use door::{Door, DoorKind, LockedDoor, Teleport, DOOR_FRAME_COUNT};
pub use trainer::{SightZone, Team, TeamMember, Trainer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

/// Condition under which the overworld calls [`Event::action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Player pushes towards the event from a neighbouring tile.
    Proximity,
    /// Player arrives on the event's tile.
    BeIn,
    /// Player presses interact while facing the event.
    Interact,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("frame set '{frame_set}' is empty")]
    EmptyFrameSet { frame_set: String },
    #[error("frame set '{frame_set}' has {actual} frames, {required} required")]
    FrameSetTooSmall {
        frame_set: String,
        required: usize,
        actual: usize,
    },
    #[error("scripted movement needs at least one step")]
    EmptyScriptedPath,
    #[error("sight zone {zone} watches for trainer {trainer}, which is not a trainer on the same map")]
    UnknownSightZoneTrainer { zone: u64, trainer: u64 },
}

/// Where an event sits and how it can be triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub tile: TileCoord,
    pub trigger: TriggerKind,
    pub sides: SideMask,
    pub passable: bool,
}

impl Placement {
    pub fn new(tile: TileCoord, trigger: TriggerKind) -> Self {
        Self {
            tile,
            trigger,
            sides: SideMask::ALL,
            passable: false,
        }
    }

    pub fn with_sides(mut self, sides: SideMask) -> Self {
        self.sides = sides;
        self
    }

    pub fn with_passable(mut self, passable: bool) -> Self {
        self.passable = passable;
        self
    }
}

/// State every event owns exactly once, whatever capabilities it carries.
#[derive(Debug, Clone)]
pub struct EventBase {
    position: GridPosition,
    visual_offset: Vec2,
    frames: Arc<FrameSet>,
    cursor: FrameCursor,
    passable: bool,
    sides: SideMask,
    trigger: TriggerKind,
    sprite: Sprite,
}

impl EventBase {
    pub fn new(frames: Arc<FrameSet>, placement: Placement) -> Result<Self, EventError> {
        if frames.is_empty() {
            return Err(EventError::EmptyFrameSet {
                frame_set: frames.name().to_string(),
            });
        }
        let mut base = Self {
            position: GridPosition::new(placement.tile, Side::Down),
            visual_offset: Vec2::ZERO,
            frames,
            cursor: FrameCursor::default(),
            passable: placement.passable,
            sides: placement.sides,
            trigger: placement.trigger,
            sprite: Sprite::default(),
        };
        base.update_texture();
        Ok(base)
    }

    fn require_frames(&self, required: usize) -> Result<(), EventError> {
        if self.frames.len() < required {
            return Err(EventError::FrameSetTooSmall {
                frame_set: self.frames.name().to_string(),
                required,
                actual: self.frames.len(),
            });
        }
        Ok(())
    }

    pub fn position(&self) -> &GridPosition {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut GridPosition {
        &mut self.position
    }

    pub fn pixel_position(&self) -> Vec2 {
        self.position.tile().to_pixels() + self.visual_offset + self.position.offset_vector()
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn frame_index(&self) -> usize {
        self.cursor.index()
    }

    pub fn select_frame(&mut self, index: usize) {
        self.cursor.select(&self.frames, index);
    }

    pub fn reset_frame(&mut self) {
        self.cursor.reset();
    }

    pub fn passable(&self) -> bool {
        self.passable
    }

    pub fn sides(&self) -> SideMask {
        self.sides
    }

    pub fn trigger(&self) -> TriggerKind {
        self.trigger
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    /// Copies position and current frame into the owned sprite.
    pub fn update_texture(&mut self) {
        self.sprite.position = self.pixel_position();
        self.sprite.texture = self.frames.get(self.cursor.index()).cloned();
    }
}

/// Closed set of composed map objects.
#[derive(Debug, Clone)]
pub enum EventKind {
    Teleporter(Teleport),
    Door(Door),
    LockedDoor(LockedDoor),
    Talking(Dialogue),
    Character(Character),
    TalkingCharacter(TalkingCharacter),
    Trainer(Trainer),
    SightZone(SightZone),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Teleporter(_) => "teleporter",
            Self::Door(_) => "door",
            Self::LockedDoor(_) => "locked_door",
            Self::Talking(_) => "talking",
            Self::Character(_) => "character",
            Self::TalkingCharacter(_) => "talking_character",
            Self::Trainer(_) => "trainer",
            Self::SightZone(_) => "sight_zone",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    base: EventBase,
    kind: EventKind,
}

impl Event {
    pub fn teleporter(
        id: EventId,
        frames: Arc<FrameSet>,
        placement: Placement,
        teleport: Teleport,
    ) -> Result<Self, EventError> {
        Ok(Self::assemble(
            id,
            EventBase::new(frames, placement)?,
            EventKind::Teleporter(teleport),
        ))
    }

    pub fn door(
        id: EventId,
        frames: Arc<FrameSet>,
        placement: Placement,
        door_tag: &str,
        teleport: Teleport,
    ) -> Result<Self, EventError> {
        let mut base = EventBase::new(frames, placement)?;
        base.require_frames(DOOR_FRAME_COUNT)?;
        let door = Door::new(DoorKind::parse(door_tag), teleport);
        base.visual_offset = door.kind().visual_offset();
        Ok(Self::assemble(id, base, EventKind::Door(door)))
    }

    pub fn locked_door(
        id: EventId,
        frames: Arc<FrameSet>,
        placement: Placement,
        door: LockedDoor,
    ) -> Result<Self, EventError> {
        let mut base = EventBase::new(frames, placement)?;
        base.require_frames(DOOR_FRAME_COUNT)?;
        base.visual_offset = door.door().kind().visual_offset();
        Ok(Self::assemble(id, base, EventKind::LockedDoor(door)))
    }

    pub fn talking(
        id: EventId,
        frames: Arc<FrameSet>,
        placement: Placement,
        dialogue: Dialogue,
    ) -> Result<Self, EventError> {
        Ok(Self::assemble(
            id,
            EventBase::new(frames, placement)?,
            EventKind::Talking(dialogue),
        ))
    }

    pub fn character(
        id: EventId,
        frames: Arc<FrameSet>,
        placement: Placement,
        facing: Side,
        character: Character,
    ) -> Result<Self, EventError> {
        let base = Self::character_base(frames, placement, facing)?;
        Ok(Self::assemble(id, base, EventKind::Character(character)))
    }

    pub fn talking_character(
        id: EventId,
        frames: Arc<FrameSet>,
        placement: Placement,
        facing: Side,
        talker: TalkingCharacter,
    ) -> Result<Self, EventError> {
        let base = Self::character_base(frames, placement, facing)?;
        Ok(Self::assemble(id, base, EventKind::TalkingCharacter(talker)))
    }

    pub fn trainer(
        id: EventId,
        frames: Arc<FrameSet>,
        placement: Placement,
        facing: Side,
        trainer: Trainer,
    ) -> Result<Self, EventError> {
        let base = Self::character_base(frames, placement, facing)?;
        Ok(Self::assemble(id, base, EventKind::Trainer(trainer)))
    }

    /// Invisible, always passable zone that alerts `trainer` when entered.
    pub fn sight_zone(
        id: EventId,
        neutral_frames: Arc<FrameSet>,
        tile: TileCoord,
        trainer: EventId,
    ) -> Result<Self, EventError> {
        let placement = Placement::new(tile, TriggerKind::BeIn)
            .with_sides(SideMask::ALL)
            .with_passable(true);
        Ok(Self::assemble(
            id,
            EventBase::new(neutral_frames, placement)?,
            EventKind::SightZone(SightZone::new(trainer)),
        ))
    }

    fn character_base(
        frames: Arc<FrameSet>,
        placement: Placement,
        facing: Side,
    ) -> Result<EventBase, EventError> {
        let mut base = EventBase::new(frames, placement)?;
        base.require_frames(CHARACTER_FRAME_COUNT)?;
        base.visual_offset = Vec2::new(16.0, 0.0);
        base.sprite.scale = 2.0;
        base.sprite.origin = Vec2::new(16.0, 16.0);
        base.position.set_facing(facing);
        base.select_frame(facing.frame_index());
        Ok(base)
    }

    fn assemble(id: EventId, mut base: EventBase, kind: EventKind) -> Self {
        base.update_texture();
        Self { id, base, kind }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn base(&self) -> &EventBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut EventBase {
        &mut self.base
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EventKind {
        &mut self.kind
    }

    pub fn tile(&self) -> TileCoord {
        self.base.position.tile()
    }

    /// Tiles this event blocks: its own and the destination of a step in flight.
    pub fn occupied_tiles(&self) -> impl Iterator<Item = TileCoord> {
        std::iter::once(self.base.position.tile()).chain(self.base.position.destination())
    }

    /// Reacts to the trigger condition becoming satisfied.
    pub fn action(&mut self, ctx: &mut EventContext<'_>) {
        let id = self.id;
        match &mut self.kind {
            EventKind::Teleporter(teleport) => teleport.perform(ctx),
            EventKind::Door(door) => door.action(ctx),
            EventKind::LockedDoor(door) => door.action(id, ctx),
            EventKind::Talking(dialogue) => dialogue.start(id, ctx),
            EventKind::Character(_) => {}
            EventKind::TalkingCharacter(talker) => talker.action(&mut self.base),
            EventKind::Trainer(trainer) => trainer.action(&mut self.base),
            EventKind::SightZone(zone) => zone.action(ctx),
        }
    }

    /// Advances timers and movement. Called once per frame for every live event.
    pub fn update(&mut self, ctx: &mut EventContext<'_>) {
        let id = self.id;
        match &mut self.kind {
            EventKind::Teleporter(_) | EventKind::Talking(_) | EventKind::SightZone(_) => {}
            EventKind::Door(door) => door.update(&mut self.base, ctx),
            EventKind::LockedDoor(door) => door.update(&mut self.base, ctx),
            EventKind::Character(character) => character.update(&mut self.base, ctx),
            EventKind::TalkingCharacter(talker) => talker.update(id, &mut self.base, ctx),
            EventKind::Trainer(trainer) => trainer.update(id, &mut self.base, ctx),
        }
    }

    pub fn update_texture(&mut self) {
        self.base.update_texture();
    }

    /// Re-resolves every dialogue key against the current language.
    pub fn on_language_changed(&mut self, localizer: &dyn Localizer) {
        match &mut self.kind {
            EventKind::Talking(dialogue) => dialogue.reload(localizer),
            EventKind::LockedDoor(door) => door.dialogue_mut().reload(localizer),
            EventKind::TalkingCharacter(talker) => talker.dialogue_mut().reload(localizer),
            EventKind::Trainer(trainer) => trainer.reload_dialogue(localizer),
            EventKind::Teleporter(_)
            | EventKind::Door(_)
            | EventKind::Character(_)
            | EventKind::SightZone(_) => {}
        }
    }

    /// Signals a trainer that the player walked into its line of sight.
    pub fn alert(&mut self) -> bool {
        match &mut self.kind {
            EventKind::Trainer(trainer) => trainer.spot(&mut self.base),
            _ => false,
        }
    }

    /// Marks a trainer as beaten. Returns false for anything else.
    pub fn defeat(&mut self, localizer: &dyn Localizer) -> bool {
        match &mut self.kind {
            EventKind::Trainer(trainer) => {
                trainer.defeat(localizer);
                true
            }
            _ => false,
        }
    }

    pub fn as_trainer(&self) -> Option<&Trainer> {
        match &self.kind {
            EventKind::Trainer(trainer) => Some(trainer),
            _ => None,
        }
    }
}
