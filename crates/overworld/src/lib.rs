pub mod collision;
pub mod events;
pub mod frames;
pub mod geometry;
pub mod grid;
pub mod lang;
pub mod overworld;
pub mod player;

pub use collision::{CollisionMap, Tilemap, TilemapError, BLOCKED_TILE_ID};
pub use events::{
    Character, Dialogue, Door, DoorKind, Event, EventBase, EventContext, EventError, EventId,
    EventKind, FrameContext, LockedDoor, MoveStyle, OverworldRequest, Placement, SightZone,
    TalkingCharacter, Team, TeamMember, Teleport, Trainer, TriggerKind, CHARACTER_FRAME_COUNT,
    DOOR_FRAME_COUNT,
};
pub use frames::{FrameCatalog, FrameCursor, FrameSet, Sprite, TextureKey, TextureKeyError};
pub use geometry::{Side, SideMask, TileCoord, Vec2};
pub use grid::{GridPosition, StepProgress};
pub use lang::{Localizer, StringTable};
pub use overworld::{
    FrameInput, GameMap, Overworld, OverworldConfig, OverworldError, OverworldEvent,
};
pub use player::{Inventory, ItemId, Player};

/// Edge length of one map tile, in pixels.
pub const TILE_SIZE_PX: f32 = 32.0;
/// Pixels travelled per update tick while a step is in progress.
pub const STEP_PIXELS_PER_TICK: f32 = 4.0;
/// Update ticks a single step takes, including the tick that snaps to the tile.
pub const STEP_TICKS: u32 = 7;
