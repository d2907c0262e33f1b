//! Reference overworld: owns the maps and the player, decides when events
//! trigger, ticks them once per frame and applies what they ask for.

use std::collections::{BTreeMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collision::{CollisionMap, Tilemap};
use crate::events::{
    Event, EventContext, EventError, EventId, EventKind, FrameContext, OverworldRequest,
    TriggerKind,
};
use crate::geometry::{Side, TileCoord};
use crate::grid::StepProgress;
use crate::lang::{Localizer, StringTable};
use crate::player::Player;

/// Request rounds applied per frame before the rest is dropped.
const MAX_REQUEST_ROUNDS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverworldConfig {
    pub rng_seed: u64,
    pub language: String,
}

impl Default for OverworldConfig {
    fn default() -> Self {
        Self {
            rng_seed: 0,
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverworldError {
    #[error("unknown map '{map}'")]
    UnknownMap { map: String },
    #[error("map '{map}' is defined more than once")]
    DuplicateMap { map: String },
    #[error("event {id} is defined more than once on map '{map}'")]
    DuplicateEvent { map: String, id: u64 },
    #[error("invalid event on map '{map}'")]
    InvalidEvent {
        map: String,
        #[source]
        source: EventError,
    },
    #[error("no event {id} on the current map")]
    UnknownEvent { id: u64 },
    #[error("event {id} is not a trainer")]
    NotATrainer { id: u64 },
}

/// One frame of player input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    direction: Option<Side>,
    interact: bool,
}

impl FrameInput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: Option<Side>) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_interact(mut self, interact: bool) -> Self {
        self.interact = interact;
        self
    }

    pub fn direction(&self) -> Option<Side> {
        self.direction
    }

    pub fn interact(&self) -> bool {
        self.interact
    }
}

/// Things that happened during a frame, for the layers above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverworldEvent {
    DialogueStarted { source: EventId, lines: Vec<String> },
    DialogueClosed { source: EventId },
    SoundPlayed { cue: String },
    Teleported { map: String, tile: TileCoord },
    BattleDeclared { trainer: EventId },
    TrainerDefeated { trainer: EventId },
}

#[derive(Debug, Clone)]
pub struct GameMap {
    id: String,
    tilemap: Tilemap,
    events: Vec<Event>,
}

impl GameMap {
    pub fn new(id: impl Into<String>, tilemap: Tilemap) -> Self {
        Self {
            id: id.into(),
            tilemap,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id() == id)
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|event| event.id() == id)
    }

    /// Event ids are unique per map and every sight zone watches for a
    /// trainer placed on the same map.
    fn validate(&self) -> Result<(), OverworldError> {
        let mut seen = HashSet::new();
        for event in &self.events {
            if !seen.insert(event.id()) {
                return Err(OverworldError::DuplicateEvent {
                    map: self.id.clone(),
                    id: event.id().0,
                });
            }
        }
        for event in &self.events {
            let EventKind::SightZone(zone) = event.kind() else {
                continue;
            };
            let watched = self
                .event(zone.trainer())
                .and_then(Event::as_trainer)
                .is_some();
            if !watched {
                return Err(OverworldError::InvalidEvent {
                    map: self.id.clone(),
                    source: EventError::UnknownSightZoneTrainer {
                        zone: event.id().0,
                        trainer: zone.trainer().0,
                    },
                });
            }
        }
        Ok(())
    }

    /// Tiles blocked for the mover at `skip` (or for the player when `None`).
    fn blocked_tiles(&self, skip: Option<usize>, player: Option<&Player>) -> HashSet<TileCoord> {
        let mut blocked: HashSet<TileCoord> = self
            .events
            .iter()
            .enumerate()
            .filter(|(index, event)| Some(*index) != skip && !event.base().passable())
            .flat_map(|(_, event)| event.occupied_tiles())
            .collect();
        if let Some(player) = player {
            blocked.insert(player.tile());
            blocked.extend(player.position().destination());
        }
        blocked
    }
}

/// Tilemap plus the tiles other movers hold or are stepping into.
struct CollisionView<'a> {
    tilemap: &'a Tilemap,
    blocked: HashSet<TileCoord>,
}

impl CollisionMap for CollisionView<'_> {
    fn is_passable(&self, from: TileCoord, side: Side) -> bool {
        self.tilemap.is_passable(from, side) && !self.blocked.contains(&from.neighbour(side))
    }
}

#[derive(Debug, Clone)]
struct OpenDialogue {
    source: EventId,
    lines: Vec<String>,
    line: usize,
}

pub struct Overworld {
    maps: BTreeMap<String, GameMap>,
    current_map: String,
    player: Player,
    strings: StringTable,
    rng: StdRng,
    frame: FrameContext,
    dialogue: Option<OpenDialogue>,
    queued_dialogues: VecDeque<OpenDialogue>,
    pending_battles: Vec<EventId>,
    outbox: Vec<OverworldEvent>,
    frame_count: u64,
}

impl Overworld {
    pub fn new(
        config: OverworldConfig,
        strings: StringTable,
        player: Player,
        start_map: &str,
        maps: Vec<GameMap>,
    ) -> Result<Self, OverworldError> {
        let mut by_id = BTreeMap::new();
        for map in maps {
            map.validate()?;
            let id = map.id().to_string();
            if by_id.insert(id.clone(), map).is_some() {
                return Err(OverworldError::DuplicateMap { map: id });
            }
        }
        if !by_id.contains_key(start_map) {
            return Err(OverworldError::UnknownMap {
                map: start_map.to_string(),
            });
        }

        let mut overworld = Self {
            maps: by_id,
            current_map: start_map.to_string(),
            player,
            strings,
            rng: StdRng::seed_from_u64(config.rng_seed),
            frame: FrameContext::default(),
            dialogue: None,
            queued_dialogues: VecDeque::new(),
            pending_battles: Vec::new(),
            outbox: Vec::new(),
            frame_count: 0,
        };
        if overworld.strings.language() != config.language {
            overworld.set_language(&config.language);
        }
        info!(
            map = start_map,
            map_count = overworld.maps.len(),
            "overworld_ready"
        );
        Ok(overworld)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn current_map(&self) -> &GameMap {
        &self.maps[&self.current_map]
    }

    pub fn map(&self, id: &str) -> Option<&GameMap> {
        self.maps.get(id)
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn frame_context(&self) -> &FrameContext {
        &self.frame
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Line currently on screen, if a dialogue is open.
    pub fn dialogue_line(&self) -> Option<&str> {
        self.dialogue
            .as_ref()
            .and_then(|open| open.lines.get(open.line))
            .map(String::as_str)
    }

    pub fn is_dialogue_open(&self) -> bool {
        self.dialogue.is_some()
    }

    pub fn pending_battles(&self) -> &[EventId] {
        &self.pending_battles
    }

    pub fn take_pending_battles(&mut self) -> Vec<EventId> {
        std::mem::take(&mut self.pending_battles)
    }

    pub fn drain_outbox(&mut self) -> Vec<OverworldEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Switches language and re-resolves the dialogue of every loaded event.
    pub fn set_language(&mut self, language: &str) -> bool {
        if !self.strings.set_language(language) {
            return false;
        }
        for map in self.maps.values_mut() {
            for event in &mut map.events {
                event.on_language_changed(&self.strings);
            }
        }
        true
    }

    /// Reports the outcome of a battle against `trainer` on the current map.
    pub fn defeat_trainer(&mut self, trainer: EventId) -> Result<(), OverworldError> {
        let Some(map) = self.maps.get_mut(&self.current_map) else {
            return Err(OverworldError::UnknownMap {
                map: self.current_map.clone(),
            });
        };
        let event = map
            .event_mut(trainer)
            .ok_or(OverworldError::UnknownEvent { id: trainer.0 })?;
        if !event.defeat(&self.strings) {
            return Err(OverworldError::NotATrainer { id: trainer.0 });
        }
        self.pending_battles.retain(|pending| *pending != trainer);
        self.outbox.push(OverworldEvent::TrainerDefeated { trainer });
        Ok(())
    }

    /// Runs one frame.
    pub fn step(&mut self, input: FrameInput) {
        self.frame.begin_frame();
        self.frame_count += 1;

        if self.dialogue.is_some() {
            if input.interact() {
                self.advance_dialogue();
            }
        } else {
            self.handle_player_input(input);
        }

        if self.player.advance_step() == StepProgress::Arrived {
            self.fire_be_in();
        }

        self.update_events();
        self.apply_requests();

        if let Some(map) = self.maps.get_mut(&self.current_map) {
            for event in &mut map.events {
                event.update_texture();
            }
        }
    }

    fn handle_player_input(&mut self, input: FrameInput) {
        let position = self.player.position();
        if position.is_animating() || position.is_locked() {
            return;
        }
        let facing = position.facing();
        let tile = position.tile();

        if input.interact() {
            self.fire_at(tile.neighbour(facing), TriggerKind::Interact, facing.opposite());
            return;
        }

        let Some(direction) = input.direction() else {
            return;
        };
        self.player.position_mut().set_facing(direction);
        self.fire_at(
            tile.neighbour(direction),
            TriggerKind::Proximity,
            direction.opposite(),
        );

        let Some(map) = self.maps.get(&self.current_map) else {
            return;
        };
        let view = CollisionView {
            tilemap: &map.tilemap,
            blocked: map.blocked_tiles(None, None),
        };
        self.player
            .position_mut()
            .move_toward(Some(direction), &view);
    }

    fn fire_be_in(&mut self) {
        let tile = self.player.tile();
        let side = self.player.facing().opposite();
        self.fire_at(tile, TriggerKind::BeIn, side);
    }

    /// Calls `action` on every event at `tile` with a matching trigger whose
    /// sides include `side`, the side of the event the player stands on.
    fn fire_at(&mut self, tile: TileCoord, trigger: TriggerKind, side: Side) {
        let Some(map) = self.maps.get(&self.current_map) else {
            return;
        };
        let targets: Vec<(usize, EventId)> = map
            .events
            .iter()
            .enumerate()
            .filter(|(_, event)| {
                let base = event.base();
                event.tile() == tile && base.trigger() == trigger && base.sides().contains(side)
            })
            .map(|(index, event)| (index, event.id()))
            .collect();
        for (index, id) in targets {
            debug!(event = id.0, trigger = ?trigger, "event_triggered");
            self.dispatch(index, |event, ctx| event.action(ctx));
        }
    }

    fn update_events(&mut self) {
        let count = self
            .maps
            .get(&self.current_map)
            .map_or(0, |map| map.events.len());
        for index in 0..count {
            self.dispatch(index, |event, ctx| event.update(ctx));
        }
    }

    fn dispatch(&mut self, index: usize, call: impl FnOnce(&mut Event, &mut EventContext<'_>)) {
        let Some(map) = self.maps.get_mut(&self.current_map) else {
            return;
        };
        let blocked = map.blocked_tiles(Some(index), Some(&self.player));
        let GameMap {
            tilemap, events, ..
        } = map;
        let Some(event) = events.get_mut(index) else {
            return;
        };
        let view = CollisionView {
            tilemap: &*tilemap,
            blocked,
        };
        let mut ctx = EventContext {
            player: &mut self.player,
            collision: &view,
            frame: &mut self.frame,
            rng: &mut self.rng,
        };
        call(event, &mut ctx);
    }

    fn apply_requests(&mut self) {
        for _ in 0..MAX_REQUEST_ROUNDS {
            let requests = self.frame.drain_requests();
            if requests.is_empty() {
                return;
            }
            for request in requests {
                self.apply_request(request);
            }
        }
        let dropped = self.frame.drain_requests().len();
        if dropped > 0 {
            warn!(dropped, frame = self.frame_count, "overworld_requests_dropped");
        }
    }

    fn apply_request(&mut self, request: OverworldRequest) {
        match request {
            OverworldRequest::Teleport { map, tile, facing } => self.teleport(map, tile, facing),
            OverworldRequest::StartDialogue { source, lines } => {
                if lines.is_empty() {
                    debug!(event = source.0, "empty_dialogue_skipped");
                    return;
                }
                self.queued_dialogues.push_back(OpenDialogue {
                    source,
                    lines,
                    line: 0,
                });
                if self.dialogue.is_none() {
                    self.open_next_dialogue();
                }
            }
            OverworldRequest::PlaySound { cue } => {
                self.outbox.push(OverworldEvent::SoundPlayed { cue });
            }
            OverworldRequest::DeclareBattle { trainer } => {
                self.pending_battles.push(trainer);
                self.outbox.push(OverworldEvent::BattleDeclared { trainer });
            }
            OverworldRequest::SpotPlayer { trainer } => {
                let alerted = self
                    .maps
                    .get_mut(&self.current_map)
                    .and_then(|map| map.event_mut(trainer))
                    .map(Event::alert);
                match alerted {
                    Some(true) => debug!(trainer = trainer.0, "trainer_spotted_player"),
                    Some(false) => {}
                    None => warn!(trainer = trainer.0, "sight_zone_without_trainer"),
                }
            }
        }
    }

    fn teleport(&mut self, map: String, tile: TileCoord, facing: Option<Side>) {
        if !self.maps.contains_key(&map) {
            warn!(map = %map, "teleport_to_unknown_map");
            return;
        }
        self.current_map = map.clone();
        self.player.position_mut().place(tile);
        if let Some(facing) = facing {
            self.player.position_mut().set_facing(facing);
        }
        info!(map = %map, x = tile.x, y = tile.y, "teleported");
        self.outbox.push(OverworldEvent::Teleported { map, tile });
        self.fire_be_in();
    }

    fn open_next_dialogue(&mut self) {
        self.dialogue = self.queued_dialogues.pop_front();
        if let Some(open) = &self.dialogue {
            self.outbox.push(OverworldEvent::DialogueStarted {
                source: open.source,
                lines: open.lines.clone(),
            });
        }
    }

    fn advance_dialogue(&mut self) {
        let Some(open) = &mut self.dialogue else {
            return;
        };
        open.line += 1;
        if open.line < open.lines.len() {
            return;
        }
        let source = open.source;
        self.dialogue = None;
        self.outbox.push(OverworldEvent::DialogueClosed { source });
        self.open_next_dialogue();
    }

    /// Looks an event up on the current map.
    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.current_map().event(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_world() -> Overworld {
        Overworld::new(
            OverworldConfig::default(),
            StringTable::new("en"),
            Player::new(TileCoord::new(1, 1), Side::Down),
            "town",
            vec![GameMap::new("town", Tilemap::open(4, 4))],
        )
        .expect("overworld")
    }

    #[test]
    fn rejects_unknown_start_map() {
        let result = Overworld::new(
            OverworldConfig::default(),
            StringTable::new("en"),
            Player::new(TileCoord::new(0, 0), Side::Down),
            "nowhere",
            vec![GameMap::new("town", Tilemap::open(2, 2))],
        );
        assert_eq!(
            result.err(),
            Some(OverworldError::UnknownMap {
                map: "nowhere".to_string()
            })
        );
    }

    #[test]
    fn rejects_duplicate_maps() {
        let result = Overworld::new(
            OverworldConfig::default(),
            StringTable::new("en"),
            Player::new(TileCoord::new(0, 0), Side::Down),
            "town",
            vec![
                GameMap::new("town", Tilemap::open(2, 2)),
                GameMap::new("town", Tilemap::open(3, 3)),
            ],
        );
        assert!(matches!(result, Err(OverworldError::DuplicateMap { .. })));
    }

    #[test]
    fn player_walks_one_tile_per_step() {
        let mut world = empty_world();
        world.step(FrameInput::empty().with_direction(Some(Side::Right)));
        for _ in 1..crate::STEP_TICKS {
            world.step(FrameInput::empty());
        }
        assert_eq!(world.player().tile(), TileCoord::new(2, 1));
        assert!(!world.player().position().is_animating());
    }

    #[test]
    fn player_turns_but_stays_when_blocked_by_map_edge() {
        let mut world = empty_world();
        world.player_mut().position_mut().place(TileCoord::new(0, 0));
        world.step(FrameInput::empty().with_direction(Some(Side::Up)));
        assert_eq!(world.player().facing(), Side::Up);
        assert!(!world.player().position().is_animating());
    }

    #[test]
    fn defeat_of_unknown_event_is_an_error() {
        let mut world = empty_world();
        assert_eq!(
            world.defeat_trainer(EventId(99)),
            Err(OverworldError::UnknownEvent { id: 99 })
        );
    }
}
