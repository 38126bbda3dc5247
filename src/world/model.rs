//! The turn simulation.
//!
//! `WorldModel` owns the logical world (who stands where, what they carry)
//! and drives a `MacroViewModel` to present each turn:
//!
//! 1. Planning: `spawn`, `intend`, `craft`, ...
//! 2. `tick()`: NPCs pick directions, intents become bids, the tile auction
//!    runs, bumps are resolved by the mechanics, occupancy swaps to the
//!    next generation. View commands are staged along the way.
//! 3. `animate()` per frame.
//! 4. `tock()`: the view commits, per-turn state is cleared.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::config::WorldConfig;
use crate::core::error::{EngineError, Result};
use crate::core::{Direction, EffectKind, EntityId, EntityKind, LocationId, WorldRng};
use crate::macro_view::{MacroViewModel, Phase};
use crate::spatial::Progress;

use super::auction::{hold_auction, Award, Bid, Intent};
use super::inventory::Inventory;
use super::mechanics::{Bump, BumpOutcome, CraftOutcome, Kit, Mechanics};
use super::snapshot::{EntitySnapshot, WorldSnapshot};
use super::topology::{Cursor, Topology};

/// One resolved bump and what came of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpRecord {
    pub bump: Bump,
    /// `None` when no interaction matched.
    pub outcome: Option<BumpOutcome>,
}

/// Summary of a resolved turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Entities that moved, in award order.
    pub moved: Vec<EntityId>,
    /// Entities that bounced (lost an auction or hit an occupied tile).
    pub bounced: Vec<EntityId>,
    /// Bumps that reached the mechanics.
    pub bumps: Vec<BumpRecord>,
    /// Entities that left the map (felled or taken).
    pub removed: Vec<EntityId>,
}

/// Logical world state, also the [`Kit`] handed to mechanics.
#[derive(Default)]
struct WorldState {
    view: MacroViewModel,

    /// Kinds of every live entity, on the map or in an inventory.
    kinds: FxHashMap<EntityId, EntityKind>,
    locations: FxHashMap<EntityId, LocationId>,
    inventories: FxHashMap<EntityId, Inventory>,
    effects: FxHashMap<EntityId, EffectKind>,
    mobiles: BTreeSet<EntityId>,

    /// Occupancy at the start of the turn.
    occupants: FxHashMap<LocationId, EntityId>,
    /// Occupancy being built for the next turn.
    next: FxHashMap<LocationId, EntityId>,

    next_id: u32,

    // Per-turn bookkeeping, cleared by `tock`.
    moved: FxHashSet<EntityId>,
    relocations: Vec<(EntityId, LocationId)>,
    felled: Vec<EntityId>,
    taken: Vec<EntityId>,
}

impl WorldState {
    fn allocate(&mut self) -> Result<EntityId> {
        let id = EntityId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| EngineError::Bookkeeping("entity ids exhausted".to_string()))?;
        Ok(id)
    }

    /// On the map and not already leaving it this turn.
    fn is_present(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
            && !self.felled.contains(&entity)
            && !self.taken.contains(&entity)
    }

    /// Vacate an entity's tile in the next generation.
    fn vacate_next(&mut self, entity: EntityId) {
        let relocated = self
            .relocations
            .iter()
            .rev()
            .find(|(e, _)| *e == entity)
            .map(|&(_, destination)| destination);
        if let Some(location) = relocated.or_else(|| self.locations.get(&entity).copied()) {
            if self.next.get(&location) == Some(&entity) {
                self.next.remove(&location);
            }
        }
    }

    /// Forget an entity and everything it carries.
    fn purge(&mut self, entity: EntityId) {
        self.kinds.remove(&entity);
        self.effects.remove(&entity);
        self.mobiles.remove(&entity);
        if let Some(inventory) = self.inventories.remove(&entity) {
            for (_, item) in inventory.items() {
                self.purge(item);
            }
        }
    }

    fn apply_award(&mut self, award: &Award, report: &mut TurnReport) -> Result<Option<Bump>> {
        match *award {
            Award::Move(bid) => {
                self.vacate_next(bid.entity);
                self.next.insert(bid.destination, bid.entity);
                self.moved.insert(bid.entity);
                self.relocations.push((bid.entity, bid.destination));
                if bid.transit {
                    let kind = self.kinds.get(&bid.entity).copied().unwrap_or_default();
                    self.view
                        .jump(bid.entity, bid.destination, bid.direction, bid.turn, kind)?;
                } else {
                    self.view
                        .move_entity(bid.entity, bid.destination, bid.direction, bid.turn)?;
                }
                report.moved.push(bid.entity);
                Ok(None)
            }
            Award::Bounce(bid) => {
                self.view.bounce(bid.entity, bid.direction)?;
                report.bounced.push(bid.entity);
                Ok(None)
            }
            Award::Bump { bid, patient } => {
                self.view.bounce(bid.entity, bid.direction)?;
                report.bounced.push(bid.entity);
                Ok(Some(Bump {
                    agent: bid.entity,
                    patient,
                    direction: bid.direction,
                    destination: bid.destination,
                }))
            }
        }
    }

    /// Make the next generation current.
    fn swap_generations(&mut self) {
        for (entity, destination) in self.relocations.drain(..) {
            self.locations.insert(entity, destination);
        }
        for &entity in self.felled.iter().chain(&self.taken) {
            self.locations.remove(&entity);
        }
        for entity in std::mem::take(&mut self.felled) {
            self.purge(entity);
        }
        // Taken entities live on as inventory items.
        self.taken.clear();
        std::mem::swap(&mut self.occupants, &mut self.next);
        self.next.clear();
    }
}

impl Kit for WorldState {
    fn kind_of(&self, entity: EntityId) -> Option<EntityKind> {
        self.kinds.get(&entity).copied()
    }

    fn inventory(&self, entity: EntityId) -> Option<&Inventory> {
        self.inventories.get(&entity)
    }

    fn effect_of(&self, entity: EntityId) -> EffectKind {
        self.effects.get(&entity).copied().unwrap_or_default()
    }

    fn location_of(&self, entity: EntityId) -> Option<LocationId> {
        self.locations.get(&entity).copied()
    }

    fn take(&mut self, agent: EntityId, patient: EntityId, direction: Direction) -> Result<bool> {
        if !self.is_present(patient) || self.moved.contains(&patient) {
            return Ok(false);
        }
        let inventory = self
            .inventories
            .get_mut(&agent)
            .ok_or(EngineError::UnknownEntity(agent))?;
        let Some(slot) = inventory.first_free() else {
            return Ok(false);
        };
        inventory.set(slot, Some(patient));

        self.vacate_next(patient);
        self.taken.push(patient);
        self.mobiles.remove(&patient);
        // Patient slides back toward the agent.
        self.view.take(patient, direction.opposite())?;
        trace!(%agent, %patient, slot, "took");
        Ok(true)
    }

    fn fell(&mut self, patient: EntityId) -> Result<bool> {
        if !self.is_present(patient) {
            return Ok(false);
        }
        self.vacate_next(patient);
        self.felled.push(patient);
        self.view.fell(patient)?;
        trace!(%patient, "felled");
        Ok(true)
    }

    fn put(&mut self, agent: EntityId, slot: usize, kind: Option<EntityKind>) -> Result<Option<EntityId>> {
        let inventory = self
            .inventories
            .get(&agent)
            .ok_or(EngineError::UnknownEntity(agent))?;
        if !inventory.has_slot(slot) {
            return Err(EngineError::InventorySlot { entity: agent, slot });
        }

        let item = match kind {
            Some(kind) => {
                let item = self.allocate()?;
                self.kinds.insert(item, kind);
                Some(item)
            }
            None => None,
        };
        let previous = self
            .inventories
            .get_mut(&agent)
            .and_then(|inventory| inventory.set(slot, item));
        if let Some(previous) = previous {
            self.purge(previous);
        }
        Ok(item)
    }

    fn set_effect(&mut self, entity: EntityId, effect: EffectKind) -> Result<()> {
        if !self.kinds.contains_key(&entity) {
            return Err(EngineError::UnknownEntity(entity));
        }
        if effect == EffectKind::NONE {
            self.effects.remove(&entity);
        } else {
            self.effects.insert(entity, effect);
        }
        Ok(())
    }
}

/// Turn-based world simulation over an external topology and mechanics.
///
/// ```
/// use tile_world::core::{Direction, EntityKind, WorldConfig};
/// use tile_world::world::{GridTopology, MechanicsTable, WorldModel};
///
/// let grid = GridTopology::new(3, 1);
/// let mut world = WorldModel::new(grid, MechanicsTable::new(), WorldConfig::default());
///
/// let walker = world.spawn(EntityKind(1), grid.location(0, 0).unwrap()).unwrap();
/// world.intend(walker, Some(Direction::East), false).unwrap();
///
/// let report = world.tick().unwrap();
/// assert_eq!(report.moved, vec![walker]);
/// world.tock().unwrap();
/// assert_eq!(world.locate(walker), grid.location(1, 0));
/// ```
pub struct WorldModel {
    state: WorldState,
    topology: Box<dyn Topology>,
    mechanics: Box<dyn Mechanics>,
    rng: WorldRng,
    intents: BTreeMap<EntityId, Intent>,
    bids: Vec<Bid>,
    bumps: Vec<Bump>,
    phase: Phase,
}

impl WorldModel {
    /// Create an empty world.
    pub fn new(
        topology: impl Topology + 'static,
        mechanics: impl Mechanics + 'static,
        config: WorldConfig,
    ) -> Self {
        Self {
            state: WorldState {
                view: MacroViewModel::new(config.ids, config.view),
                next_id: config.first_entity,
                ..WorldState::default()
            },
            topology: Box::new(topology),
            mechanics: Box::new(mechanics),
            rng: WorldRng::new(config.seed),
            intents: BTreeMap::new(),
            bids: Vec::new(),
            bumps: Vec::new(),
            phase: Phase::Planning,
        }
    }

    // === Population ===

    /// Place a new entity on a vacant tile.
    pub fn spawn(&mut self, kind: EntityKind, location: LocationId) -> Result<EntityId> {
        self.ensure_planning("spawn")?;
        if self.state.occupants.contains_key(&location) {
            return Err(EngineError::LocationOccupied(location));
        }
        let entity = self.state.allocate()?;
        self.state.view.put(entity, location, kind)?;
        self.state.kinds.insert(entity, kind);
        self.state.locations.insert(entity, location);
        self.state.occupants.insert(location, entity);
        self.state.inventories.insert(entity, Inventory::new());
        Ok(entity)
    }

    /// Remove an entity from the map immediately, without animation.
    pub fn despawn(&mut self, entity: EntityId) -> Result<()> {
        self.ensure_planning("despawn")?;
        let location = self
            .state
            .locations
            .remove(&entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        self.state.occupants.remove(&location);
        self.state.purge(entity);
        self.intents.remove(&entity);
        self.state.view.remove(entity)
    }

    /// Mark an entity as wandering on its own when it has no intent.
    pub fn set_mobile(&mut self, entity: EntityId, mobile: bool) -> Result<()> {
        if !self.state.locations.contains_key(&entity) {
            return Err(EngineError::UnknownEntity(entity));
        }
        if mobile {
            self.state.mobiles.insert(entity);
        } else {
            self.state.mobiles.remove(&entity);
        }
        Ok(())
    }

    /// Put a fresh item in an inventory slot (or clear it with `None`).
    pub fn put_item(&mut self, agent: EntityId, slot: usize, kind: Option<EntityKind>) -> Result<Option<EntityId>> {
        self.ensure_planning("put_item")?;
        self.state.put(agent, slot, kind)
    }

    /// Set or clear (`EffectKind::NONE`) an entity's active effect.
    pub fn set_effect(&mut self, entity: EntityId, effect: EffectKind) -> Result<()> {
        self.ensure_planning("set_effect")?;
        self.state.set_effect(entity, effect)
    }

    // === Planning ===

    /// Record what an entity wants to do this turn, replacing any earlier
    /// intent. A `None` direction stays put.
    pub fn intend(&mut self, entity: EntityId, direction: Option<Direction>, deliberate: bool) -> Result<()> {
        self.ensure_planning("intend")?;
        if !self.state.locations.contains_key(&entity) {
            return Err(EngineError::UnknownEntity(entity));
        }
        self.intents.insert(entity, Intent { direction, deliberate });
        Ok(())
    }

    /// Combine two inventory items of `agent` through the mechanics.
    pub fn craft(&mut self, agent: EntityId, first: usize, second: usize) -> Result<Option<CraftOutcome>> {
        self.ensure_planning("craft")?;
        if !self.state.inventories.contains_key(&agent) {
            return Err(EngineError::UnknownEntity(agent));
        }
        self.mechanics.craft(&mut self.state, agent, first, second)
    }

    // === Turn ===

    /// Resolve the turn. A second call before `tock` does nothing.
    pub fn tick(&mut self) -> Result<TurnReport> {
        let mut report = TurnReport::default();
        if self.phase == Phase::Animating {
            return Ok(report);
        }

        for &entity in &self.state.mobiles {
            if !self.intents.contains_key(&entity) {
                self.intents.insert(entity, Intent::toward(self.rng.direction()));
            }
        }

        self.bids.clear();
        for (&entity, intent) in &self.intents {
            let origin = self.state.locations.get(&entity).copied().ok_or_else(|| {
                EngineError::Bookkeeping(format!("intent for {entity} without a location"))
            })?;
            let Some(direction) = intent.direction else {
                continue;
            };
            let Some(advance) = self.topology.advance(Cursor {
                position: origin,
                direction,
            }) else {
                trace!(%entity, %origin, ?direction, "intent dropped at boundary");
                continue;
            };
            self.bids.push(Bid {
                entity,
                origin,
                direction,
                destination: advance.position,
                turn: advance.turn,
                transit: advance.transit,
                deliberate: intent.deliberate,
            });
        }

        self.state.next = self.state.occupants.clone();

        let occupants = &self.state.occupants;
        let awards = hold_auction(
            self.bids.iter().copied(),
            |location| occupants.get(&location).copied(),
            &mut self.rng,
        );
        for award in &awards {
            if let Some(bump) = self.state.apply_award(award, &mut report)? {
                self.bumps.push(bump);
            }
        }

        for bump in &self.bumps {
            if !self.state.is_present(bump.agent) || !self.state.is_present(bump.patient) {
                continue;
            }
            if self.state.moved.contains(&bump.patient) {
                trace!(agent = %bump.agent, patient = %bump.patient, "bump target moved away");
                continue;
            }
            let outcome = self.mechanics.bump(&mut self.state, bump)?;
            report.bumps.push(BumpRecord {
                bump: *bump,
                outcome,
            });
        }

        report.removed = self
            .state
            .felled
            .iter()
            .chain(&self.state.taken)
            .copied()
            .collect();
        self.state.swap_generations();

        self.state.view.tick();
        self.phase = Phase::Animating;
        debug!(
            bids = self.bids.len(),
            moved = report.moved.len(),
            bounced = report.bounced.len(),
            bumps = report.bumps.len(),
            removed = report.removed.len(),
            "world tick"
        );
        Ok(report)
    }

    /// Render one frame of the current turn.
    pub fn animate(&mut self, progress: &Progress) {
        self.state.view.animate(progress);
    }

    /// Commit the turn and return to planning.
    pub fn tock(&mut self) -> Result<()> {
        self.state.view.tock()?;
        if self.phase == Phase::Animating {
            self.intents.clear();
            self.bids.clear();
            self.bumps.clear();
            self.state.moved.clear();
            self.phase = Phase::Planning;
        }
        Ok(())
    }

    // === Persistence ===

    /// Capture the world between turns.
    pub fn snapshot(&self) -> Result<WorldSnapshot> {
        self.ensure_planning("snapshot")?;
        let mut entities: Vec<EntitySnapshot> = self
            .state
            .kinds
            .iter()
            .map(|(&id, &kind)| EntitySnapshot {
                id,
                kind,
                location: self.state.locations.get(&id).copied(),
                inventory: self.state.inventories.get(&id).cloned(),
                effect: self.state.effects.get(&id).copied().unwrap_or_default(),
                mobile: self.state.mobiles.contains(&id),
            })
            .collect();
        entities.sort_unstable_by_key(|e| e.id);
        Ok(WorldSnapshot {
            entities,
            next_id: self.state.next_id,
            rng: self.rng.state(),
        })
    }

    /// Rebuild a world from a snapshot.
    ///
    /// The view starts fresh: watchers must be registered again.
    pub fn restore(
        snapshot: &WorldSnapshot,
        topology: impl Topology + 'static,
        mechanics: impl Mechanics + 'static,
        config: WorldConfig,
    ) -> Result<Self> {
        let mut world = Self::new(topology, mechanics, config);
        world.rng = WorldRng::from_state(&snapshot.rng);
        world.state.next_id = snapshot.next_id;

        for entity in &snapshot.entities {
            let state = &mut world.state;
            if state.kinds.insert(entity.id, entity.kind).is_some() {
                return Err(EngineError::DuplicateEntity(entity.id));
            }
            if let Some(location) = entity.location {
                if state.occupants.insert(location, entity.id).is_some() {
                    return Err(EngineError::LocationOccupied(location));
                }
                state.locations.insert(entity.id, location);
                state.view.put(entity.id, location, entity.kind)?;
            }
            if let Some(inventory) = &entity.inventory {
                state.inventories.insert(entity.id, inventory.clone());
            }
            if entity.effect != EffectKind::NONE {
                state.effects.insert(entity.id, entity.effect);
            }
            if entity.mobile {
                state.mobiles.insert(entity.id);
            }
        }
        Ok(world)
    }

    // === Queries ===

    #[must_use]
    pub fn locate(&self, entity: EntityId) -> Option<LocationId> {
        self.state.locations.get(&entity).copied()
    }

    /// Who stands on a tile.
    #[must_use]
    pub fn entity_at(&self, location: LocationId) -> Option<EntityId> {
        self.state.occupants.get(&location).copied()
    }

    #[must_use]
    pub fn kind_of(&self, entity: EntityId) -> Option<EntityKind> {
        self.state.kinds.get(&entity).copied()
    }

    #[must_use]
    pub fn inventory(&self, entity: EntityId) -> Option<&Inventory> {
        self.state.inventories.get(&entity)
    }

    #[must_use]
    pub fn effect_of(&self, entity: EntityId) -> EffectKind {
        self.state.effect_of(entity)
    }

    #[must_use]
    pub fn is_mobile(&self, entity: EntityId) -> bool {
        self.state.mobiles.contains(&entity)
    }

    /// Pending intent of an entity this turn.
    #[must_use]
    pub fn intent(&self, entity: EntityId) -> Option<&Intent> {
        self.intents.get(&entity)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn macro_view(&self) -> &MacroViewModel {
        &self.state.view
    }

    /// Mutable view access, for registering watchers between turns.
    pub fn macro_view_mut(&mut self) -> &mut MacroViewModel {
        &mut self.state.view
    }

    fn ensure_planning(&self, command: &'static str) -> Result<()> {
        match self.phase {
            Phase::Planning => Ok(()),
            Phase::Animating => Err(EngineError::PlanningPhaseViolation { command }),
        }
    }
}

impl fmt::Debug for WorldModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldModel")
            .field("phase", &self.phase)
            .field("entities", &self.state.kinds.len())
            .field("on_map", &self.state.locations.len())
            .field("intents", &self.intents.len())
            .field("view", &self.state.view)
            .finish()
    }
}
