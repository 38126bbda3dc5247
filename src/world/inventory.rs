//! Agent inventories.
//!
//! An inventory is a fixed row of slots, each empty or holding an item
//! entity. The first two slots are the hands: what an agent holds there
//! decides which interactions a bump triggers.

use serde::{Deserialize, Serialize};

use crate::core::EntityId;

/// Number of slots per inventory.
pub const INVENTORY_SLOTS: usize = 10;

/// Slot of the left hand.
pub const LEFT_HAND: usize = 0;

/// Slot of the right hand.
pub const RIGHT_HAND: usize = 1;

/// Fixed-size item storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: [Option<EntityId>; INVENTORY_SLOTS],
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Item in a slot. Out-of-range slots read as empty.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<EntityId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Store (or clear) a slot, returning what was there.
    ///
    /// Returns `None` without effect for an out-of-range slot; callers
    /// check ranges with [`Inventory::has_slot`].
    pub fn set(&mut self, slot: usize, item: Option<EntityId>) -> Option<EntityId> {
        let cell = self.slots.get_mut(slot)?;
        std::mem::replace(cell, item)
    }

    #[must_use]
    pub fn has_slot(&self, slot: usize) -> bool {
        slot < INVENTORY_SLOTS
    }

    /// First empty slot, hands first.
    #[must_use]
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Occupied slots with their items.
    pub fn items(&self) -> impl Iterator<Item = (usize, EntityId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| item.map(|item| (slot, item)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut inventory = Inventory::new();
        assert!(inventory.is_empty());

        assert_eq!(inventory.set(RIGHT_HAND, Some(EntityId(5))), None);
        assert_eq!(inventory.get(RIGHT_HAND), Some(EntityId(5)));
        assert_eq!(inventory.get(LEFT_HAND), None);

        assert_eq!(inventory.set(RIGHT_HAND, None), Some(EntityId(5)));
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_first_free_prefers_hands() {
        let mut inventory = Inventory::new();
        assert_eq!(inventory.first_free(), Some(LEFT_HAND));

        inventory.set(LEFT_HAND, Some(EntityId(1)));
        assert_eq!(inventory.first_free(), Some(RIGHT_HAND));

        for slot in 0..INVENTORY_SLOTS {
            inventory.set(slot, Some(EntityId(slot as u32 + 1)));
        }
        assert_eq!(inventory.first_free(), None);
    }

    #[test]
    fn test_out_of_range_slot() {
        let mut inventory = Inventory::new();
        assert!(!inventory.has_slot(INVENTORY_SLOTS));
        assert_eq!(inventory.set(INVENTORY_SLOTS, Some(EntityId(1))), None);
        assert_eq!(inventory.get(INVENTORY_SLOTS), None);
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_items_lists_occupied_slots() {
        let mut inventory = Inventory::new();
        inventory.set(3, Some(EntityId(30)));
        inventory.set(7, Some(EntityId(70)));
        let items: Vec<_> = inventory.items().collect();
        assert_eq!(items, vec![(3, EntityId(30)), (7, EntityId(70))]);
    }
}
