//! Macro view model: the command vocabulary for entity visual lifecycles.
//!
//! Callers name entities by *external* id. Each command resolves the
//! external id to the internal id this model owns, applies the turn's
//! animation right away, and records any structural change (relocation,
//! removal) for `tock` to commit once the animation has played.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::{IdConfig, ViewConfig};
use crate::core::error::{EngineError, Result};
use crate::core::{Direction, EntityId, EntityKind, LocationId};
use crate::spatial::{Progress, SpatialViewModel, Stage, Transition};

use super::ids::IdAllocator;

/// Whether commands are currently accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Between `tock` and `tick`: commands may be issued.
    #[default]
    Planning,
    /// Between `tick` and `tock`: the turn is being presented.
    Animating,
}

/// Token returned by [`MacroViewModel::down`].
///
/// Releasing it performs the matching `up`. Dropping it does not: the
/// entity stays pressed until `up` is called for it or it is removed.
#[must_use = "a press that is never released keeps its entity pressed"]
#[derive(Debug, PartialEq, Eq)]
pub struct Press {
    external: EntityId,
}

impl Press {
    /// The external entity being pressed.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.external
    }

    /// Release the press.
    pub fn release(self, view: &mut MacroViewModel) {
        view.up(self.external);
    }
}

/// Orchestrates entity visual effects over one `SpatialViewModel`.
///
/// ## Turn discipline
///
/// 1. Planning: issue commands (`move_entity`, `take`, `replace`, ...).
/// 2. `tick()`: enter the animating phase; commands now fail with
///    `PlanningPhaseViolation`.
/// 3. `animate()` once per frame.
/// 4. `tock()`: commit deferred moves, then removals, then reset.
///
/// ```
/// use tile_world::core::{Direction, EntityId, EntityKind, LocationId};
/// use tile_world::macro_view::MacroViewModel;
///
/// let mut view = MacroViewModel::default();
/// view.put(EntityId(1), LocationId(0), EntityKind(7)).unwrap();
/// view.move_entity(EntityId(1), LocationId(1), Direction::East, 0).unwrap();
///
/// // Relocation waits for the commit.
/// assert_eq!(view.locate(EntityId(1)), Some(LocationId(0)));
/// view.tick();
/// view.tock().unwrap();
/// assert_eq!(view.locate(EntityId(1)), Some(LocationId(1)));
/// ```
#[derive(Default)]
pub struct MacroViewModel {
    spatial: SpatialViewModel,
    ids: IdAllocator,

    /// external -> internal
    to_internal: FxHashMap<EntityId, EntityId>,
    /// internal -> external, only for live bindings
    to_external: FxHashMap<EntityId, EntityId>,

    phase: Phase,

    // Per-turn staging, keyed by internal id. Cleared by `tock`.
    moves: FxHashMap<EntityId, LocationId>,
    removals: FxHashSet<EntityId>,
    replaced: FxHashSet<EntityId>,
}

impl MacroViewModel {
    /// Create a model with the given id allocation and view tuning.
    #[must_use]
    pub fn new(ids: IdConfig, view: ViewConfig) -> Self {
        Self {
            spatial: SpatialViewModel::new(view),
            ids: IdAllocator::new(ids),
            ..Self::default()
        }
    }

    // === Immediate commands ===

    /// Place a new entity. Applies immediately.
    ///
    /// Returns the internal id.
    pub fn put(&mut self, external: EntityId, location: LocationId, kind: EntityKind) -> Result<EntityId> {
        self.ensure_planning("put")?;
        self.bind(external, location, kind)
    }

    /// Remove an entity without animation. Applies immediately.
    pub fn remove(&mut self, external: EntityId) -> Result<()> {
        self.ensure_planning("remove")?;
        let internal = self.resolve(external)?;
        self.spatial.remove(internal)?;
        self.moves.remove(&internal);
        self.removals.remove(&internal);
        self.unbind(internal);
        Ok(())
    }

    // === Deferred removal ===

    /// Animate an entity being picked up toward `direction`; removed on commit.
    pub fn take(&mut self, external: EntityId, direction: Direction) -> Result<()> {
        self.ensure_planning("take")?;
        let internal = self.resolve(external)?;
        self.stage(internal, Transition::exiting().with_direction(direction), None)?;
        self.removals.insert(internal);
        Ok(())
    }

    /// Topple an entity; removed on commit.
    pub fn fell(&mut self, external: EntityId) -> Result<()> {
        self.ensure_planning("fell")?;
        let internal = self.resolve(external)?;
        self.stage(internal, Transition::tumble(), None)?;
        self.removals.insert(internal);
        Ok(())
    }

    /// Fade an entity out; removed on commit.
    pub fn exit(&mut self, external: EntityId) -> Result<()> {
        self.ensure_planning("exit")?;
        let internal = self.resolve(external)?;
        self.stage(internal, Transition::exiting(), None)?;
        self.removals.insert(internal);
        Ok(())
    }

    // === Entering ===

    /// Create an entity at `origin` that travels to `destination`.
    ///
    /// The entity is placed at the origin right away, tagged as entering,
    /// and relocated on commit.
    pub fn give(
        &mut self,
        external: EntityId,
        origin: LocationId,
        destination: LocationId,
        kind: EntityKind,
        direction: Direction,
    ) -> Result<EntityId> {
        self.ensure_planning("give")?;
        let internal = self.bind(external, origin, kind)?;
        self.stage(
            internal,
            Transition::entering().with_direction(direction),
            Some(destination),
        )?;
        self.moves.insert(internal, destination);
        Ok(internal)
    }

    /// Tag an entity as entering this turn. No structural change.
    pub fn enter(&mut self, external: EntityId) -> Result<()> {
        self.ensure_planning("enter")?;
        let internal = self.resolve(external)?;
        self.stage(internal, Transition::entering(), None)
    }

    // === Motion ===

    /// Travel to `destination`, turning by `turn` quarter turns.
    pub fn move_entity(
        &mut self,
        external: EntityId,
        destination: LocationId,
        direction: Direction,
        turn: i32,
    ) -> Result<()> {
        self.ensure_planning("move")?;
        let internal = self.resolve(external)?;
        self.stage(internal, Transition::moving(direction, turn), Some(destination))?;
        self.moves.insert(internal, destination);
        Ok(())
    }

    /// Lean toward `direction` and come back.
    pub fn bounce(&mut self, external: EntityId, direction: Direction) -> Result<()> {
        self.ensure_planning("bounce")?;
        let internal = self.resolve(external)?;
        self.stage(internal, Transition::bounce(direction), None)
    }

    // === Replacement ===

    /// Swap an entity's representation for one of a new kind.
    ///
    /// The new representation is placed at the same location immediately
    /// and the external id now resolves to it. The old one fades out and
    /// is removed on commit.
    pub fn replace(&mut self, external: EntityId, kind: EntityKind) -> Result<EntityId> {
        self.ensure_planning("replace")?;
        let (old, new) = self.rebind(external, kind)?;
        self.stage(old, Transition::exiting(), None)?;
        self.stage(new, Transition::entering(), None)?;
        Ok(new)
    }

    /// Replace and relocate: the old representation leaves toward
    /// `direction` while the new one arrives at `destination`.
    ///
    /// Used when motion cannot be interpolated, e.g. across a seam.
    pub fn jump(
        &mut self,
        external: EntityId,
        destination: LocationId,
        direction: Direction,
        turn: i32,
        kind: EntityKind,
    ) -> Result<EntityId> {
        self.ensure_planning("jump")?;
        let (old, new) = self.rebind(external, kind)?;
        self.stage(
            old,
            Transition::moving(direction, turn).with_stage(Stage::Exit),
            None,
        )?;
        self.stage(
            new,
            Transition::moving(direction, turn).with_stage(Stage::Enter),
            Some(destination),
        )?;
        self.moves.insert(new, destination);
        Ok(new)
    }

    /// Move and replace: both representations travel to `destination`,
    /// the old one is dropped on arrival.
    pub fn moving_replace(
        &mut self,
        external: EntityId,
        destination: LocationId,
        direction: Direction,
        turn: i32,
        kind: EntityKind,
    ) -> Result<EntityId> {
        self.ensure_planning("moving_replace")?;
        let (old, new) = self.rebind(external, kind)?;
        self.stage(old, Transition::moving(direction, turn), Some(destination))?;
        self.stage(
            new,
            Transition::moving(direction, turn).with_stage(Stage::Enter),
            Some(destination),
        )?;
        self.moves.insert(old, destination);
        self.moves.insert(new, destination);
        Ok(new)
    }

    // === Pressure ===

    /// Press an entity. Accepted in either phase.
    pub fn down(&mut self, external: EntityId) -> Press {
        match self.to_internal.get(&external) {
            Some(&internal) => self.spatial.down(internal),
            None => warn!(%external, "down on unknown entity ignored"),
        }
        Press { external }
    }

    /// Release an entity. Accepted in either phase; unknown ids are ignored.
    pub fn up(&mut self, external: EntityId) {
        if let Some(&internal) = self.to_internal.get(&external) {
            self.spatial.up(internal);
        }
    }

    // === Turn boundaries ===

    /// Enter the animating phase. Idempotent.
    pub fn tick(&mut self) {
        if self.phase == Phase::Planning {
            debug!(
                moves = self.moves.len(),
                removals = self.removals.len() + self.replaced.len(),
                "macro view tick"
            );
            self.phase = Phase::Animating;
        }
    }

    /// Render one frame.
    pub fn animate(&mut self, progress: &Progress) {
        self.spatial.animate(progress);
    }

    /// Commit deferred moves, then removals, then reset per-turn state.
    ///
    /// Moves go first so a replaced entity is never relocated after it has
    /// been removed. A second `tock` without new commands changes nothing.
    pub fn tock(&mut self) -> Result<()> {
        let mut moves: Vec<(EntityId, LocationId)> = self.moves.drain().collect();
        moves.sort_unstable();
        for (internal, destination) in moves {
            self.spatial.move_entity(internal, destination)?;
        }

        let mut removals: Vec<EntityId> = self
            .removals
            .drain()
            .chain(self.replaced.drain())
            .collect();
        removals.sort_unstable();
        removals.dedup();
        for internal in removals {
            self.spatial.remove(internal)?;
            self.unbind(internal);
        }

        self.spatial.reset();
        self.phase = Phase::Planning;
        Ok(())
    }

    // === Queries ===

    /// Location of an external entity's current representation.
    #[must_use]
    pub fn locate(&self, external: EntityId) -> Option<LocationId> {
        self.spatial.locate(self.internal(external)?)
    }

    /// Internal id currently bound to an external id.
    #[must_use]
    pub fn internal(&self, external: EntityId) -> Option<EntityId> {
        self.to_internal.get(&external).copied()
    }

    /// External id bound to an internal id, if the binding is live.
    #[must_use]
    pub fn external(&self, internal: EntityId) -> Option<EntityId> {
        self.to_external.get(&internal).copied()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn spatial(&self) -> &SpatialViewModel {
        &self.spatial
    }

    /// Mutable access for watcher registration.
    pub fn spatial_mut(&mut self) -> &mut SpatialViewModel {
        &mut self.spatial
    }

    // === Internals ===

    fn ensure_planning(&self, command: &'static str) -> Result<()> {
        match self.phase {
            Phase::Planning => Ok(()),
            Phase::Animating => Err(EngineError::PlanningPhaseViolation { command }),
        }
    }

    fn resolve(&self, external: EntityId) -> Result<EntityId> {
        self.internal(external)
            .ok_or(EngineError::UnknownEntity(external))
    }

    fn bind(&mut self, external: EntityId, location: LocationId, kind: EntityKind) -> Result<EntityId> {
        if self.to_internal.contains_key(&external) {
            return Err(EngineError::DuplicateEntity(external));
        }
        let internal = self.ids.allocate();
        self.spatial.put(internal, location, kind)?;
        self.to_internal.insert(external, internal);
        self.to_external.insert(internal, external);
        Ok(internal)
    }

    fn unbind(&mut self, internal: EntityId) {
        if let Some(external) = self.to_external.remove(&internal) {
            if self.to_internal.get(&external) == Some(&internal) {
                self.to_internal.remove(&external);
            }
        }
    }

    /// Place a fresh representation beside the current one and point the
    /// external id at it. The old one goes in the replaced bucket.
    fn rebind(&mut self, external: EntityId, kind: EntityKind) -> Result<(EntityId, EntityId)> {
        let old = self.resolve(external)?;
        let location = self.spatial.locate(old).ok_or_else(|| {
            EngineError::Bookkeeping(format!("{external} bound to unplaced {old}"))
        })?;

        let new = self.ids.allocate();
        self.spatial.put(new, location, kind)?;
        self.spatial.transfer_pressure(old, new);
        self.to_external.remove(&old);
        self.to_internal.insert(external, new);
        self.to_external.insert(new, external);
        self.removals.remove(&old);
        self.replaced.insert(old);
        Ok((old, new))
    }

    /// Apply a transition unless nobody can see either end of it.
    fn stage(&mut self, internal: EntityId, transition: Transition, toward: Option<LocationId>) -> Result<()> {
        let visible = self.spatial.is_watched(internal)
            || toward.is_some_and(|location| self.spatial.is_location_watched(location));
        if visible {
            self.spatial.transition(internal, transition)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MacroViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroViewModel")
            .field("phase", &self.phase)
            .field("bound", &self.to_internal.len())
            .field("moves", &self.moves.len())
            .field("removals", &self.removals.len())
            .field("replaced", &self.replaced.len())
            .field("spatial", &self.spatial)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERE: LocationId = LocationId(1);
    const THERE: LocationId = LocationId(2);

    fn view_with(external: EntityId) -> MacroViewModel {
        let mut view = MacroViewModel::default();
        view.put(external, HERE, EntityKind(1)).unwrap();
        view
    }

    #[test]
    fn test_put_binds_fresh_internal() {
        let mut view = MacroViewModel::new(IdConfig::new(100, 10), ViewConfig::default());
        let internal = view.put(EntityId(1), HERE, EntityKind(1)).unwrap();

        assert_eq!(internal, EntityId(100));
        assert_eq!(view.internal(EntityId(1)), Some(EntityId(100)));
        assert_eq!(view.external(EntityId(100)), Some(EntityId(1)));
        assert_eq!(view.locate(EntityId(1)), Some(HERE));
    }

    #[test]
    fn test_duplicate_external_rejected() {
        let mut view = view_with(EntityId(1));
        assert_eq!(
            view.put(EntityId(1), THERE, EntityKind(1)),
            Err(EngineError::DuplicateEntity(EntityId(1)))
        );
    }

    #[test]
    fn test_remove_is_immediate() {
        let mut view = view_with(EntityId(1));
        let internal = view.internal(EntityId(1)).unwrap();
        view.remove(EntityId(1)).unwrap();

        assert_eq!(view.locate(EntityId(1)), None);
        assert_eq!(view.external(internal), None);
        assert!(view.spatial().is_empty());
    }

    #[test]
    fn test_take_defers_removal() {
        let mut view = view_with(EntityId(1));
        view.take(EntityId(1), Direction::West).unwrap();
        assert_eq!(view.locate(EntityId(1)), Some(HERE));

        view.tick();
        view.tock().unwrap();
        assert_eq!(view.locate(EntityId(1)), None);
        assert_eq!(view.internal(EntityId(1)), None);
    }

    #[test]
    fn test_commands_rejected_while_animating() {
        let mut view = view_with(EntityId(1));
        view.tick();

        let err = view.move_entity(EntityId(1), THERE, Direction::East, 0).unwrap_err();
        assert_eq!(err, EngineError::PlanningPhaseViolation { command: "move" });
        assert!(view.put(EntityId(2), HERE, EntityKind(1)).is_err());
        assert!(view.bounce(EntityId(1), Direction::North).is_err());

        view.tock().unwrap();
        view.move_entity(EntityId(1), THERE, Direction::East, 0).unwrap();
    }

    #[test]
    fn test_tick_is_idempotent() {
        let mut view = view_with(EntityId(1));
        view.tick();
        view.tick();
        assert_eq!(view.phase(), Phase::Animating);
        view.tock().unwrap();
        assert_eq!(view.phase(), Phase::Planning);
    }

    #[test]
    fn test_replace_rebinds_immediately() {
        let mut view = view_with(EntityId(1));
        let old = view.internal(EntityId(1)).unwrap();
        let new = view.replace(EntityId(1), EntityKind(9)).unwrap();

        assert_ne!(old, new);
        assert_eq!(view.internal(EntityId(1)), Some(new));
        assert_eq!(view.spatial().kind_of(new), Some(EntityKind(9)));
        // The old representation lingers until commit.
        assert_eq!(view.spatial().locate(old), Some(HERE));

        view.tick();
        view.tock().unwrap();
        assert_eq!(view.spatial().locate(old), None);
        assert_eq!(view.locate(EntityId(1)), Some(HERE));
    }

    #[test]
    fn test_jump_relocates_new_representation() {
        let mut view = view_with(EntityId(1));
        let old = view.internal(EntityId(1)).unwrap();
        let new = view
            .jump(EntityId(1), THERE, Direction::East, 1, EntityKind(1))
            .unwrap();

        view.tick();
        view.tock().unwrap();
        assert_eq!(view.spatial().locate(new), Some(THERE));
        assert_eq!(view.spatial().locate(old), None);
        assert_eq!(view.spatial().len(), 1);
    }

    #[test]
    fn test_moving_replace_moves_then_drops_old() {
        let mut view = view_with(EntityId(1));
        let old = view.internal(EntityId(1)).unwrap();
        view.moving_replace(EntityId(1), THERE, Direction::South, 0, EntityKind(4))
            .unwrap();

        view.tick();
        view.tock().unwrap();
        assert_eq!(view.spatial().locate(old), None);
        assert_eq!(view.locate(EntityId(1)), Some(THERE));
        assert_eq!(
            view.spatial().kind_of(view.internal(EntityId(1)).unwrap()),
            Some(EntityKind(4))
        );
    }

    #[test]
    fn test_unwatched_entities_get_no_transition() {
        let mut view = view_with(EntityId(1));
        view.bounce(EntityId(1), Direction::North).unwrap();
        let internal = view.internal(EntityId(1)).unwrap();
        assert!(view.spatial().transition_of(internal).is_none());
    }

    #[test]
    fn test_second_tock_is_a_no_op() {
        let mut view = view_with(EntityId(1));
        view.move_entity(EntityId(1), THERE, Direction::East, 0).unwrap();
        view.tick();
        view.tock().unwrap();

        let internal = view.internal(EntityId(1)).unwrap();
        view.spatial_mut().move_entity(internal, HERE).unwrap();
        view.tock().unwrap();
        assert_eq!(view.locate(EntityId(1)), Some(HERE));
    }

    #[test]
    fn test_press_release() {
        let mut view = view_with(EntityId(1));
        let press = view.down(EntityId(1));
        assert_eq!(press.entity(), EntityId(1));
        press.release(&mut view);

        // Unknown ids never fault.
        let ghost = view.down(EntityId(42));
        ghost.release(&mut view);
    }
}
