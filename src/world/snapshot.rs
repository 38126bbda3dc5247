//! Serializable world state between turns.

use serde::{Deserialize, Serialize};

use crate::core::{EffectKind, EntityId, EntityKind, LocationId, WorldRngState};

use super::inventory::Inventory;

/// One live entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    /// `None` for items held in an inventory.
    pub location: Option<LocationId>,
    pub inventory: Option<Inventory>,
    pub effect: EffectKind,
    pub mobile: bool,
}

/// Everything needed to rebuild a [`WorldModel`](super::WorldModel),
/// except the topology and mechanics, which are code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Sorted by id.
    pub entities: Vec<EntitySnapshot>,
    pub next_id: u32,
    pub rng: WorldRngState,
}

impl WorldSnapshot {
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|index| &self.entities[index])
    }
}
