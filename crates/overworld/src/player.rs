use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Side, TileCoord, Vec2};
use crate::grid::{GridPosition, StepProgress};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    counts: HashMap<ItemId, u32>,
}

impl Inventory {
    pub fn count(&self, item: &ItemId) -> u32 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    pub fn has(&self, item: &ItemId) -> bool {
        self.count(item) > 0
    }

    pub fn add(&mut self, item: ItemId, amount: u32) {
        let count = self.counts.entry(item).or_insert(0);
        *count = count.saturating_add(amount);
    }

    /// Removes one unit. Returns false when the item is not held.
    pub fn consume(&mut self, item: &ItemId) -> bool {
        let Some(count) = self.counts.get_mut(item) else {
            return false;
        };
        if *count == 0 {
            return false;
        }
        *count -= 1;
        if *count == 0 {
            self.counts.remove(item);
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    position: GridPosition,
    pub inventory: Inventory,
}

impl Player {
    pub fn new(tile: TileCoord, facing: Side) -> Self {
        Self {
            position: GridPosition::new(tile, facing),
            inventory: Inventory::default(),
        }
    }

    pub fn position(&self) -> &GridPosition {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut GridPosition {
        &mut self.position
    }

    pub fn tile(&self) -> TileCoord {
        self.position.tile()
    }

    pub fn facing(&self) -> Side {
        self.position.facing()
    }

    pub fn pixel_position(&self) -> Vec2 {
        self.position.tile().to_pixels() + self.position.offset_vector()
    }

    pub fn advance_step(&mut self) -> StepProgress {
        self.position.advance_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_decrements_and_drops_empty_entries() {
        let key = ItemId::new("item.key");
        let mut inventory = Inventory::default();
        inventory.add(key.clone(), 2);
        assert!(inventory.consume(&key));
        assert_eq!(inventory.count(&key), 1);
        assert!(inventory.consume(&key));
        assert!(!inventory.has(&key));
        assert!(!inventory.consume(&key));
    }

    #[test]
    fn player_pixel_position_tracks_tile() {
        let player = Player::new(TileCoord::new(2, 3), Side::Down);
        assert_eq!(player.pixel_position(), Vec2::new(64.0, 96.0));
    }
}
