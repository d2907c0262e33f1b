use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use overworld::{
    Character, Dialogue, Door, DoorKind, Event, EventError, EventId, FrameCatalog, FrameInput,
    FrameSet, GameMap, ItemId, LockedDoor, MoveStyle, Overworld, OverworldConfig, OverworldError,
    Placement, Player, Side, SideMask, StringTable, TalkingCharacter, Team, Teleport,
    TextureKeyError, TileCoord, Tilemap, TilemapError, Trainer, TriggerKind, BLOCKED_TILE_ID,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_SCENARIO_JSON: &str = include_str!("default_scenario.json");

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse scenario json: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("parse scenario json at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid frame set '{name}': {source}")]
    FrameSet {
        name: String,
        #[source]
        source: TextureKeyError,
    },
    #[error("event {event} refers to unknown frame set '{frame_set}'")]
    UnknownFrameSet { event: u64, frame_set: String },
    #[error("invalid tiles for map '{map}': {source}")]
    Tilemap {
        map: String,
        #[source]
        source: TilemapError,
    },
    #[error("invalid event {event} on map '{map}': {source}")]
    Event {
        map: String,
        event: u64,
        #[source]
        source: EventError,
    },
    #[error(transparent)]
    Overworld(#[from] OverworldError),
}

/// Complete demo input: world content plus the inputs to replay.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) start_map: String,
    pub(crate) player: PlayerDef,
    pub(crate) strings: StringTable,
    /// Frame set name to frame count; frames are `<name>/<index>`.
    #[serde(default)]
    pub(crate) frame_sets: BTreeMap<String, usize>,
    pub(crate) maps: Vec<MapDef>,
    #[serde(default)]
    pub(crate) script: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlayerDef {
    pub(crate) tile: TileCoord,
    #[serde(default = "default_facing")]
    pub(crate) facing: Side,
    #[serde(default)]
    pub(crate) inventory: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MapDef {
    pub(crate) id: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Full tile grid, row-major. Omitted means every tile is walkable.
    #[serde(default)]
    pub(crate) tiles: Option<Vec<u16>>,
    #[serde(default)]
    pub(crate) blocked: Vec<TileCoord>,
    #[serde(default)]
    pub(crate) events: Vec<EventDef>,
}

/// Fields every event carries. Omitted trigger rules fall back to the
/// defaults of the event kind.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EventCommon {
    pub(crate) id: u64,
    pub(crate) tile: TileCoord,
    #[serde(default)]
    pub(crate) trigger: Option<TriggerKind>,
    #[serde(default)]
    pub(crate) sides: Option<SideMask>,
    #[serde(default)]
    pub(crate) passable: Option<bool>,
    #[serde(default)]
    pub(crate) frames: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TeleportDef {
    pub(crate) map: String,
    pub(crate) tile: TileCoord,
    #[serde(default)]
    pub(crate) facing: Option<Side>,
}

impl From<TeleportDef> for Teleport {
    fn from(def: TeleportDef) -> Self {
        Teleport::new(def.map, def.tile, def.facing)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum EventDef {
    Teleporter {
        #[serde(flatten)]
        common: EventCommon,
        destination: TeleportDef,
    },
    Door {
        #[serde(flatten)]
        common: EventCommon,
        #[serde(default = "default_door_tag")]
        door: String,
        destination: TeleportDef,
    },
    LockedDoor {
        #[serde(flatten)]
        common: EventCommon,
        #[serde(default = "default_door_tag")]
        door: String,
        destination: TeleportDef,
        dialogue: Vec<String>,
        required_item: String,
        #[serde(default = "default_true")]
        consume_item: bool,
    },
    Talking {
        #[serde(flatten)]
        common: EventCommon,
        dialogue: Vec<String>,
    },
    Character {
        #[serde(flatten)]
        common: EventCommon,
        #[serde(default = "default_facing")]
        facing: Side,
        #[serde(default = "default_style")]
        style: MoveStyle,
        #[serde(default)]
        path: Vec<Side>,
    },
    TalkingCharacter {
        #[serde(flatten)]
        common: EventCommon,
        #[serde(default = "default_facing")]
        facing: Side,
        #[serde(default = "default_style")]
        style: MoveStyle,
        #[serde(default)]
        path: Vec<Side>,
        dialogue: Vec<String>,
    },
    Trainer {
        #[serde(flatten)]
        common: EventCommon,
        #[serde(default = "default_facing")]
        facing: Side,
        #[serde(default = "default_style")]
        style: MoveStyle,
        #[serde(default)]
        path: Vec<Side>,
        dialogue: Vec<String>,
        defeated_dialogue: Vec<String>,
        #[serde(default)]
        team: Team,
    },
    SightZone {
        #[serde(flatten)]
        common: EventCommon,
        trainer: u64,
    },
}

/// Input held for `frames` frames. `interact` is pressed on the first frame
/// only; `language` is switched before the first frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptStep {
    #[serde(default = "default_frames")]
    pub(crate) frames: u32,
    #[serde(default)]
    pub(crate) direction: Option<Side>,
    #[serde(default)]
    pub(crate) interact: bool,
    #[serde(default)]
    pub(crate) language: Option<String>,
}

impl ScriptStep {
    pub(crate) fn input_for_frame(&self, frame: u32) -> FrameInput {
        FrameInput::empty()
            .with_direction(self.direction)
            .with_interact(self.interact && frame == 0)
    }
}

fn default_facing() -> Side {
    Side::Down
}

fn default_style() -> MoveStyle {
    MoveStyle::Stationary
}

fn default_door_tag() -> String {
    "door".to_string()
}

fn default_true() -> bool {
    true
}

fn default_frames() -> u32 {
    1
}

pub(crate) fn default_scenario() -> Result<Scenario, ScenarioError> {
    parse_scenario_json(DEFAULT_SCENARIO_JSON)
}

pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let scenario = parse_scenario_json(&raw)?;
    info!(path = %path.display(), maps = scenario.maps.len(), "scenario_loaded");
    Ok(scenario)
}

pub(crate) fn parse_scenario_json(raw: &str) -> Result<Scenario, ScenarioError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        if path.is_empty() || path == "." {
            ScenarioError::Parse { source }
        } else {
            ScenarioError::ParseAt { path, source }
        }
    })
}

impl Scenario {
    /// Builds the overworld from the content. The script is replayed by the caller.
    pub(crate) fn build(&self, config: OverworldConfig) -> Result<Overworld, ScenarioError> {
        let catalog = self.frame_catalog()?;

        let mut player = Player::new(self.player.tile, self.player.facing);
        for (item, count) in &self.player.inventory {
            player.inventory.add(ItemId::new(item.clone()), *count);
        }

        let maps = self
            .maps
            .iter()
            .map(|map| build_map(map, &catalog, &self.strings))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Overworld::new(
            config,
            self.strings.clone(),
            player,
            &self.start_map,
            maps,
        )?)
    }

    fn frame_catalog(&self) -> Result<FrameCatalog, ScenarioError> {
        let mut catalog = FrameCatalog::default();
        for (name, count) in &self.frame_sets {
            let set = FrameSet::numbered(name, *count).map_err(|source| {
                ScenarioError::FrameSet {
                    name: name.clone(),
                    source,
                }
            })?;
            catalog.insert(set);
        }
        Ok(catalog)
    }
}

fn build_map(
    def: &MapDef,
    catalog: &FrameCatalog,
    strings: &StringTable,
) -> Result<GameMap, ScenarioError> {
    let mut tilemap = match &def.tiles {
        Some(tiles) => Tilemap::new(def.width, def.height, tiles.clone()),
        None => Ok(Tilemap::open(def.width, def.height)),
    }
    .map_err(|source| ScenarioError::Tilemap {
        map: def.id.clone(),
        source,
    })?;
    for tile in &def.blocked {
        if !tilemap.set_tile(*tile, BLOCKED_TILE_ID) {
            warn!(map = %def.id, x = tile.x, y = tile.y, "blocked_tile_outside_map");
        }
    }

    let mut map = GameMap::new(def.id.clone(), tilemap);
    for event in &def.events {
        map.push_event(build_event(&def.id, event, catalog, strings)?);
    }
    Ok(map)
}

fn build_event(
    map: &str,
    def: &EventDef,
    catalog: &FrameCatalog,
    strings: &StringTable,
) -> Result<Event, ScenarioError> {
    let common = def.common();
    let id = EventId(common.id);
    let frames = match &common.frames {
        Some(name) => catalog
            .get(name)
            .ok_or_else(|| ScenarioError::UnknownFrameSet {
                event: common.id,
                frame_set: name.clone(),
            })?,
        None => catalog.neutral(),
    };
    let placement = def.placement();
    let dialogue = |keys: &[String]| Dialogue::new(keys.to_vec(), strings);

    let built = match def.clone() {
        EventDef::Teleporter { destination, .. } => {
            Event::teleporter(id, frames, placement, destination.into())
        }
        EventDef::Door {
            door, destination, ..
        } => Event::door(id, frames, placement, &door, destination.into()),
        EventDef::LockedDoor {
            door,
            destination,
            dialogue: keys,
            required_item,
            consume_item,
            ..
        } => Event::locked_door(
            id,
            frames,
            placement,
            LockedDoor::new(
                Door::new(DoorKind::parse(&door), destination.into()),
                dialogue(&keys),
                ItemId::new(required_item),
                consume_item,
            ),
        ),
        EventDef::Talking { dialogue: keys, .. } => {
            Event::talking(id, frames, placement, dialogue(&keys))
        }
        EventDef::Character {
            facing,
            style,
            path,
            ..
        } => Character::new(style, path)
            .and_then(|character| Event::character(id, frames, placement, facing, character)),
        EventDef::TalkingCharacter {
            facing,
            style,
            path,
            dialogue: keys,
            ..
        } => Character::new(style, path).and_then(|character| {
            let talker = TalkingCharacter::new(character, dialogue(&keys));
            Event::talking_character(id, frames, placement, facing, talker)
        }),
        EventDef::Trainer {
            facing,
            style,
            path,
            dialogue: keys,
            defeated_dialogue,
            team,
            ..
        } => Character::new(style, path).and_then(|character| {
            let talker = TalkingCharacter::new(character, dialogue(&keys));
            let trainer = Trainer::new(talker, team, defeated_dialogue);
            Event::trainer(id, frames, placement, facing, trainer)
        }),
        EventDef::SightZone { trainer, .. } => {
            Event::sight_zone(id, frames, common.tile, EventId(trainer))
        }
    };
    built.map_err(|source| ScenarioError::Event {
        map: map.to_string(),
        event: common.id,
        source,
    })
}

impl EventDef {
    fn common(&self) -> &EventCommon {
        match self {
            Self::Teleporter { common, .. }
            | Self::Door { common, .. }
            | Self::LockedDoor { common, .. }
            | Self::Talking { common, .. }
            | Self::Character { common, .. }
            | Self::TalkingCharacter { common, .. }
            | Self::Trainer { common, .. }
            | Self::SightZone { common, .. } => common,
        }
    }

    fn default_trigger(&self) -> TriggerKind {
        match self {
            Self::Teleporter { .. } | Self::SightZone { .. } => TriggerKind::BeIn,
            Self::Door { .. } | Self::LockedDoor { .. } => TriggerKind::Proximity,
            Self::Talking { .. }
            | Self::Character { .. }
            | Self::TalkingCharacter { .. }
            | Self::Trainer { .. } => TriggerKind::Interact,
        }
    }

    /// Walk-in teleporters are passable unless stated otherwise.
    fn placement(&self) -> Placement {
        let common = self.common();
        let passable_default = matches!(self, Self::Teleporter { .. });
        Placement::new(common.tile, common.trigger.unwrap_or(self.default_trigger()))
            .with_sides(common.sides.unwrap_or(SideMask::ALL))
            .with_passable(common.passable.unwrap_or(passable_default))
    }
}
