use tracing::{debug, info, warn};

use crate::geometry::{Side, TileCoord, Vec2};
use crate::player::ItemId;

use super::{Dialogue, EventBase, EventContext, EventId, OverworldRequest};

/// Closed frame plus three opening frames.
pub const DOOR_FRAME_COUNT: usize = 4;
/// Phases below this bound pick an opening frame on even values.
const DOOR_OPENING_PHASES: u32 = 8;
/// The teleport fires on the first phase past this bound.
const DOOR_TELEPORT_PHASE: u32 = 10;

/// Destination of a teleporting event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teleport {
    pub map: String,
    pub destination: TileCoord,
    /// Facing given to the player on arrival; `None` keeps the current one.
    pub facing: Option<Side>,
}

impl Teleport {
    pub fn new(map: impl Into<String>, destination: TileCoord, facing: Option<Side>) -> Self {
        Self {
            map: map.into(),
            destination,
            facing,
        }
    }

    /// Queues the teleport unless one already happened this frame.
    pub(crate) fn perform(&self, ctx: &mut EventContext<'_>) {
        if ctx.frame.just_teleported() {
            debug!(map = %self.map, "teleport_suppressed");
            return;
        }
        ctx.frame.mark_teleported();
        ctx.frame.request(OverworldRequest::Teleport {
            map: self.map.clone(),
            tile: self.destination,
            facing: self.facing,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoorKind {
    Plain,
    Shop,
    /// Unrecognised tag, kept for the sound cue and drawn like a plain door.
    Other(String),
}

impl DoorKind {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "door" => Self::Plain,
            "shop door" => Self::Shop,
            other => {
                warn!(door_kind = other, "unknown_door_kind");
                Self::Other(other.to_string())
            }
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Plain => "door",
            Self::Shop => "shop door",
            Self::Other(tag) => tag,
        }
    }

    pub fn visual_offset(&self) -> Vec2 {
        match self {
            Self::Shop => Vec2::new(-4.0, -6.0),
            Self::Plain | Self::Other(_) => Vec2::new(0.0, -6.0),
        }
    }

    pub fn sound_cue(&self) -> String {
        format!("{} sound", self.tag())
    }
}

/// Opens over a few frames, then teleports the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Door {
    kind: DoorKind,
    /// `None` while closed.
    phase: Option<u32>,
    teleport: Teleport,
}

impl Door {
    pub fn new(kind: DoorKind, teleport: Teleport) -> Self {
        Self {
            kind,
            phase: None,
            teleport,
        }
    }

    pub fn kind(&self) -> &DoorKind {
        &self.kind
    }

    pub fn teleport(&self) -> &Teleport {
        &self.teleport
    }

    pub fn is_opening(&self) -> bool {
        self.phase.is_some()
    }

    pub(crate) fn action(&mut self, ctx: &mut EventContext<'_>) {
        if self.is_opening() {
            return;
        }
        self.phase = Some(0);
        ctx.player.position_mut().lock_move();
        ctx.frame.request(OverworldRequest::PlaySound {
            cue: self.kind.sound_cue(),
        });
    }

    pub(crate) fn update(&mut self, base: &mut EventBase, ctx: &mut EventContext<'_>) {
        let Some(phase) = self.phase else {
            return;
        };
        let phase = phase + 1;
        if phase < DOOR_OPENING_PHASES && phase % 2 == 0 {
            base.select_frame((phase / 2) as usize);
            self.phase = Some(phase);
        } else if phase > DOOR_TELEPORT_PHASE {
            ctx.player.position_mut().unlock_move();
            self.teleport.perform(ctx);
            self.phase = None;
            base.reset_frame();
        } else {
            self.phase = Some(phase);
        }
    }
}

/// Door that needs an item before it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedDoor {
    door: Door,
    dialogue: Dialogue,
    required_item: ItemId,
    consume_item: bool,
    unlocked: bool,
}

impl LockedDoor {
    pub fn new(door: Door, dialogue: Dialogue, required_item: ItemId, consume_item: bool) -> Self {
        Self {
            door,
            dialogue,
            required_item,
            consume_item,
            unlocked: false,
        }
    }

    pub fn door(&self) -> &Door {
        &self.door
    }

    pub fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    pub fn dialogue_mut(&mut self) -> &mut Dialogue {
        &mut self.dialogue
    }

    pub fn required_item(&self) -> &ItemId {
        &self.required_item
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub(crate) fn action(&mut self, id: EventId, ctx: &mut EventContext<'_>) {
        if !self.unlocked {
            if !ctx.player.inventory.has(&self.required_item) {
                self.dialogue.start(id, ctx);
                return;
            }
            if self.consume_item {
                ctx.player.inventory.consume(&self.required_item);
            }
            self.unlocked = true;
            info!(
                event = id.0,
                item = %self.required_item.0,
                consumed = self.consume_item,
                "door_unlocked"
            );
        }
        self.door.action(ctx);
    }

    pub(crate) fn update(&mut self, base: &mut EventBase, ctx: &mut EventContext<'_>) {
        self.door.update(base, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::{door_frames, Harness};
    use crate::events::{Event, EventKind, Placement, TriggerKind};
    use crate::lang::StringTable;

    fn door_event(tag: &str) -> Event {
        Event::door(
            EventId(1),
            door_frames(),
            Placement::new(TileCoord::new(3, 3), TriggerKind::Proximity),
            tag,
            Teleport::new("house", TileCoord::new(1, 1), Some(Side::Up)),
        )
        .expect("door")
    }

    fn teleport_count(harness: &Harness) -> usize {
        harness
            .frame
            .pending_requests()
            .iter()
            .filter(|request| matches!(request, OverworldRequest::Teleport { .. }))
            .count()
    }

    #[test]
    fn door_opens_then_teleports_once() {
        let mut harness = Harness::new();
        let mut door = door_event("door");

        door.action(&mut harness.ctx());
        assert!(harness.player.position().is_locked());
        assert_eq!(
            harness.frame.pending_requests(),
            [OverworldRequest::PlaySound {
                cue: "door sound".to_string()
            }]
        );

        let mut frames_seen = Vec::new();
        for _ in 0..10 {
            door.update(&mut harness.ctx());
            frames_seen.push(door.base().frame_index());
        }
        assert_eq!(frames_seen, [0, 1, 1, 2, 2, 3, 3, 3, 3, 3]);
        assert!(harness.player.position().is_locked());
        assert_eq!(teleport_count(&harness), 0);

        door.update(&mut harness.ctx());
        assert!(!harness.player.position().is_locked());
        assert_eq!(door.base().frame_index(), 0);
        assert_eq!(teleport_count(&harness), 1);

        for _ in 0..20 {
            door.update(&mut harness.ctx());
        }
        assert_eq!(teleport_count(&harness), 1);
    }

    #[test]
    fn repeated_action_does_not_restart_opening() {
        let mut harness = Harness::new();
        let mut door = door_event("door");

        door.action(&mut harness.ctx());
        for _ in 0..4 {
            door.update(&mut harness.ctx());
        }
        door.action(&mut harness.ctx());
        let EventKind::Door(inner) = door.kind() else {
            panic!("expected door");
        };
        assert!(inner.is_opening());
        assert_eq!(harness.frame.pending_requests().len(), 1, "one sound only");

        for _ in 0..6 {
            door.update(&mut harness.ctx());
        }
        assert_eq!(teleport_count(&harness), 0);
        door.update(&mut harness.ctx());
        assert_eq!(teleport_count(&harness), 1);
        let EventKind::Door(inner) = door.kind() else {
            panic!("expected door");
        };
        assert!(!inner.is_opening());
    }

    #[test]
    fn teleport_guard_blocks_second_teleport_in_frame() {
        let mut harness = Harness::new();
        let teleport = Teleport::new("a", TileCoord::new(0, 0), None);
        teleport.perform(&mut harness.ctx());
        teleport.perform(&mut harness.ctx());
        assert_eq!(teleport_count(&harness), 1);

        harness.frame.begin_frame();
        teleport.perform(&mut harness.ctx());
        assert_eq!(teleport_count(&harness), 1);
    }

    #[test]
    fn unknown_door_kind_falls_back_to_plain_offset() {
        let door = door_event("garage door");
        assert_eq!(
            door.base().pixel_position(),
            TileCoord::new(3, 3).to_pixels() + Vec2::new(0.0, -6.0)
        );
        let EventKind::Door(inner) = door.kind() else {
            panic!("expected door");
        };
        assert_eq!(inner.kind().sound_cue(), "garage door sound");
    }

    #[test]
    fn shop_door_shifts_left() {
        let door = door_event("shop door");
        assert_eq!(
            door.base().pixel_position(),
            TileCoord::new(3, 3).to_pixels() + Vec2::new(-4.0, -6.0)
        );
    }

    fn locked_door(consume_item: bool) -> Event {
        let table = StringTable::new("en");
        let door = Door::new(
            DoorKind::Plain,
            Teleport::new("vault", TileCoord::new(2, 2), None),
        );
        Event::locked_door(
            EventId(2),
            door_frames(),
            Placement::new(TileCoord::new(4, 4), TriggerKind::Interact),
            LockedDoor::new(
                door,
                Dialogue::new(vec!["door.locked".into()], &table),
                ItemId::new("item.key"),
                consume_item,
            ),
        )
        .expect("locked door")
    }

    #[test]
    fn locked_door_consumes_key_when_configured() {
        let mut harness = Harness::new();
        harness.player.inventory.add(ItemId::new("item.key"), 2);
        let mut door = locked_door(true);

        door.action(&mut harness.ctx());
        assert_eq!(harness.player.inventory.count(&ItemId::new("item.key")), 1);
        assert!(harness.player.position().is_locked());

        door.action(&mut harness.ctx());
        assert_eq!(
            harness.player.inventory.count(&ItemId::new("item.key")),
            1,
            "an unlocked door does not take a second key"
        );
    }

    #[test]
    fn locked_door_keeps_key_when_not_consuming() {
        let mut harness = Harness::new();
        harness.player.inventory.add(ItemId::new("item.key"), 1);
        let mut door = locked_door(false);

        door.action(&mut harness.ctx());
        assert_eq!(harness.player.inventory.count(&ItemId::new("item.key")), 1);
        assert!(harness.player.position().is_locked());
    }

    #[test]
    fn locked_door_without_key_only_talks() {
        let mut harness = Harness::new();
        let mut door = locked_door(true);

        door.action(&mut harness.ctx());
        assert!(!harness.player.position().is_locked());
        assert!(matches!(
            harness.frame.pending_requests(),
            [OverworldRequest::StartDialogue { .. }]
        ));
        for _ in 0..12 {
            door.update(&mut harness.ctx());
        }
        assert_eq!(teleport_count(&harness), 0);
    }
}
