//! Interaction mechanics.
//!
//! When an agent deliberately walks into an occupied tile it *bumps* the
//! occupant. What happens next (chopping a tree, picking up a coin, nothing)
//! is game content, supplied through the [`Mechanics`] trait. Handlers act
//! on the world only through a [`Kit`].
//!
//! [`MechanicsTable`] is the table-driven implementation: interactions are
//! keyed by agent kind, patient kind, the kinds held in each hand and the
//! agent's active effect, with `None` acting as a wildcard.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::{Direction, EffectKind, EntityId, EntityKind, LocationId};

use super::inventory::{Inventory, LEFT_HAND, RIGHT_HAND};

/// A resolved bump: `agent` walked into `patient` at `destination`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bump {
    pub agent: EntityId,
    pub patient: EntityId,
    /// Direction of travel from the agent toward the patient.
    pub direction: Direction,
    pub destination: LocationId,
}

/// What an interaction did, for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BumpOutcome {
    /// The patient was felled and leaves the map.
    Felled,
    /// The agent took the patient into its inventory.
    Took,
    /// Something else changed (inventory, effect).
    Changed,
}

/// Result of combining two inventory items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftOutcome {
    pub product: EntityKind,
    pub byproduct: Option<EntityKind>,
}

/// Capabilities handed to interaction handlers.
pub trait Kit {
    fn kind_of(&self, entity: EntityId) -> Option<EntityKind>;

    fn inventory(&self, entity: EntityId) -> Option<&Inventory>;

    /// Active effect, `EffectKind::NONE` when there is none.
    fn effect_of(&self, entity: EntityId) -> EffectKind;

    fn location_of(&self, entity: EntityId) -> Option<LocationId>;

    /// Kind held in a slot, `EntityKind::EMPTY` for an empty slot.
    fn held(&self, entity: EntityId, slot: usize) -> EntityKind {
        self.inventory(entity)
            .and_then(|inventory| inventory.get(slot))
            .and_then(|item| self.kind_of(item))
            .unwrap_or(EntityKind::EMPTY)
    }

    /// Move `patient` off the map into the first free slot of `agent`.
    ///
    /// `direction` points from the agent toward the patient. Returns
    /// `false` when the agent has no room or the patient is gone.
    fn take(&mut self, agent: EntityId, patient: EntityId, direction: Direction) -> Result<bool>;

    /// Topple `patient` off the map. Returns `false` if it is already gone.
    fn fell(&mut self, patient: EntityId) -> Result<bool>;

    /// Put a fresh item of `kind` in a slot, or clear it with `None`.
    ///
    /// Returns the new item's id.
    fn put(&mut self, agent: EntityId, slot: usize, kind: Option<EntityKind>) -> Result<Option<EntityId>>;

    fn set_effect(&mut self, entity: EntityId, effect: EffectKind) -> Result<()>;
}

/// Game content: what bumps and crafting do.
pub trait Mechanics {
    /// Resolve a deliberate bump. `None` means nothing matched.
    fn bump(&self, kit: &mut dyn Kit, bump: &Bump) -> Result<Option<BumpOutcome>>;

    /// Combine the items in two inventory slots of `agent`.
    fn craft(
        &self,
        kit: &mut dyn Kit,
        agent: EntityId,
        first: usize,
        second: usize,
    ) -> Result<Option<CraftOutcome>>;
}

/// Interaction lookup key. `None` fields match anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BumpPattern {
    pub agent: Option<EntityKind>,
    pub patient: Option<EntityKind>,
    pub left: Option<EntityKind>,
    pub right: Option<EntityKind>,
    pub effect: Option<EffectKind>,
}

impl BumpPattern {
    /// Pattern matching every bump.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn agent(mut self, kind: EntityKind) -> Self {
        self.agent = Some(kind);
        self
    }

    #[must_use]
    pub fn patient(mut self, kind: EntityKind) -> Self {
        self.patient = Some(kind);
        self
    }

    #[must_use]
    pub fn left(mut self, kind: EntityKind) -> Self {
        self.left = Some(kind);
        self
    }

    #[must_use]
    pub fn right(mut self, kind: EntityKind) -> Self {
        self.right = Some(kind);
        self
    }

    #[must_use]
    pub fn effect(mut self, effect: EffectKind) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Blank out the fields selected by `mask`.
    ///
    /// Bit 0 effect, bit 1 right hand, bit 2 left hand, bit 3 patient,
    /// bit 4 agent.
    fn widen(self, mask: u8) -> Self {
        Self {
            agent: self.agent.filter(|_| mask & 0b1_0000 == 0),
            patient: self.patient.filter(|_| mask & 0b0_1000 == 0),
            left: self.left.filter(|_| mask & 0b0_0100 == 0),
            right: self.right.filter(|_| mask & 0b0_0010 == 0),
            effect: self.effect.filter(|_| mask & 0b0_0001 == 0),
        }
    }
}

/// Interaction handler.
pub type Interaction = Box<dyn Fn(&mut dyn Kit, &Bump) -> Result<Option<BumpOutcome>>>;

/// Handler that fells the patient.
pub fn fell_patient(kit: &mut dyn Kit, bump: &Bump) -> Result<Option<BumpOutcome>> {
    Ok(kit.fell(bump.patient)?.then_some(BumpOutcome::Felled))
}

/// Handler that takes the patient into the agent's inventory.
pub fn take_patient(kit: &mut dyn Kit, bump: &Bump) -> Result<Option<BumpOutcome>> {
    Ok(kit
        .take(bump.agent, bump.patient, bump.direction)?
        .then_some(BumpOutcome::Took))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Recipe {
    product: EntityKind,
    byproduct: Option<EntityKind>,
}

/// Table-driven [`Mechanics`].
///
/// ```
/// use tile_world::core::EntityKind;
/// use tile_world::world::{fell_patient, BumpPattern, MechanicsTable};
///
/// const LUMBERJACK: EntityKind = EntityKind(1);
/// const TREE: EntityKind = EntityKind(2);
/// const AXE: EntityKind = EntityKind(3);
///
/// let mut table = MechanicsTable::new();
/// table.on(
///     BumpPattern::any().agent(LUMBERJACK).patient(TREE).left(AXE),
///     fell_patient,
/// );
/// assert_eq!(table.len(), 1);
/// ```
pub struct MechanicsTable {
    interactions: FxHashMap<BumpPattern, Interaction>,
    recipes: FxHashMap<(EntityKind, EntityKind), Recipe>,
    /// Wildcard masks, most specific first.
    fallbacks: Vec<u8>,
}

impl Default for MechanicsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MechanicsTable {
    #[must_use]
    pub fn new() -> Self {
        let mut fallbacks: Vec<u8> = (0..32).collect();
        fallbacks.sort_by_key(|mask| (mask.count_ones(), *mask));
        Self {
            interactions: FxHashMap::default(),
            recipes: FxHashMap::default(),
            fallbacks,
        }
    }

    /// Register an interaction, replacing any handler for the same pattern.
    pub fn on<F>(&mut self, pattern: BumpPattern, handler: F) -> &mut Self
    where
        F: Fn(&mut dyn Kit, &Bump) -> Result<Option<BumpOutcome>> + 'static,
    {
        self.interactions.insert(pattern, Box::new(handler));
        self
    }

    /// Register a recipe combining `a` and `b` in either order.
    pub fn recipe(
        &mut self,
        a: EntityKind,
        b: EntityKind,
        product: EntityKind,
        byproduct: Option<EntityKind>,
    ) -> &mut Self {
        self.recipes.insert((a, b), Recipe { product, byproduct });
        self
    }

    /// Number of registered interactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Most specific interaction registered for a fully specified key.
    fn lookup(&self, key: BumpPattern) -> Option<&Interaction> {
        self.fallbacks
            .iter()
            .find_map(|&mask| self.interactions.get(&key.widen(mask)))
    }

    fn find_recipe(&self, a: EntityKind, b: EntityKind) -> Option<Recipe> {
        self.recipes
            .get(&(a, b))
            .or_else(|| self.recipes.get(&(b, a)))
            .copied()
    }
}

impl Mechanics for MechanicsTable {
    fn bump(&self, kit: &mut dyn Kit, bump: &Bump) -> Result<Option<BumpOutcome>> {
        let (Some(agent), Some(patient)) = (kit.kind_of(bump.agent), kit.kind_of(bump.patient)) else {
            return Ok(None);
        };
        let key = BumpPattern {
            agent: Some(agent),
            patient: Some(patient),
            left: Some(kit.held(bump.agent, LEFT_HAND)),
            right: Some(kit.held(bump.agent, RIGHT_HAND)),
            effect: Some(kit.effect_of(bump.agent)),
        };
        match self.lookup(key) {
            Some(handler) => handler(kit, bump),
            None => Ok(None),
        }
    }

    fn craft(
        &self,
        kit: &mut dyn Kit,
        agent: EntityId,
        first: usize,
        second: usize,
    ) -> Result<Option<CraftOutcome>> {
        if let Some(inventory) = kit.inventory(agent) {
            if let Some(&slot) = [first, second].iter().find(|&&slot| !inventory.has_slot(slot)) {
                return Err(EngineError::InventorySlot { entity: agent, slot });
            }
        }
        if first == second {
            return Ok(None);
        }
        let (a, b) = (kit.held(agent, first), kit.held(agent, second));
        if a.is_empty() || b.is_empty() {
            return Ok(None);
        }
        let Some(recipe) = self.find_recipe(a, b) else {
            return Ok(None);
        };
        kit.put(agent, first, Some(recipe.product))?;
        kit.put(agent, second, recipe.byproduct)?;
        Ok(Some(CraftOutcome {
            product: recipe.product,
            byproduct: recipe.byproduct,
        }))
    }
}
