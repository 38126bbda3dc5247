//! Spatial view model: entity placement plus per-location watchers.
//!
//! The `SpatialViewModel` tracks which location each entity occupies and
//! fans every change out to the watchers registered over that location:
//! - `put`/`remove`/`move_entity` emit enter, exit and place
//! - `watch_entities`/`unwatch_entities` replay the current occupants
//! - `transition` + `animate` drive per-frame placement during a turn
//! - `down`/`up` drive the pressure curve of pressable cells

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::core::config::ViewConfig;
use crate::core::error::{EngineError, Result};
use crate::core::{EntityId, EntityKind, LocationId};

use super::progress::Progress;
use super::watcher::{same_watcher, Coord, SharedWatcher, Transition};

/// One watcher registered over one location.
#[derive(Clone)]
struct Registration {
    coord: Coord,
    watcher: SharedWatcher,
}

/// Pressure state of a pressed (or recently released) entity.
#[derive(Clone, Copy, Debug)]
struct Pressure {
    value: f64,
    target: f64,
    /// Clock of the last `animate`, `None` until the first frame.
    last: Option<f64>,
}

impl Pressure {
    fn settled(&self) -> bool {
        self.target == 0.0 && self.value == 0.0
    }
}

/// Tracks entity placement and multiplexes watcher notifications.
///
/// ## Usage
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use tile_world::core::{EntityId, EntityKind, LocationId};
/// use tile_world::spatial::{Coord, Progress, SharedWatcher, SpatialViewModel, Transition, Watcher};
///
/// #[derive(Default)]
/// struct Count(usize);
///
/// impl Watcher for Count {
///     fn enter(&mut self, _: EntityId, _: EntityKind) { self.0 += 1; }
///     fn exit(&mut self, _: EntityId) { self.0 -= 1; }
///     fn place(&mut self, _: EntityId, _: Coord, _: f64, _: Option<&Progress>, _: Option<&Transition>) {}
/// }
///
/// let mut model = SpatialViewModel::default();
/// let count = Rc::new(RefCell::new(Count::default()));
/// let watcher: SharedWatcher = count.clone();
///
/// model.put(EntityId(1), LocationId(5), EntityKind(2)).unwrap();
/// model.watch_entities([(LocationId(5), Coord::new(0, 0, 0))], &watcher);
/// assert_eq!(count.borrow().0, 1);
///
/// model.remove(EntityId(1)).unwrap();
/// assert_eq!(count.borrow().0, 0);
/// ```
#[derive(Default)]
pub struct SpatialViewModel {
    config: ViewConfig,

    /// Entity locations: entity_id -> location
    locations: FxHashMap<EntityId, LocationId>,

    kinds: FxHashMap<EntityId, EntityKind>,

    /// Entities at each location, in arrival order.
    occupants: FxHashMap<LocationId, SmallVec<[EntityId; 2]>>,

    /// Watcher index, keyed by location.
    watchers: FxHashMap<LocationId, SmallVec<[Registration; 2]>>,

    /// Transitions for the current turn. Cleared by `reset`.
    transitions: FxHashMap<EntityId, Transition>,

    pressures: FxHashMap<EntityId, Pressure>,
}

impl SpatialViewModel {
    /// Create an empty model with the given presentation tuning.
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Introduce an entity at a location.
    ///
    /// Watchers of the location see `enter` then `place`.
    pub fn put(&mut self, entity: EntityId, location: LocationId, kind: EntityKind) -> Result<()> {
        if self.locations.contains_key(&entity) {
            return Err(EngineError::DuplicateEntity(entity));
        }

        self.locations.insert(entity, location);
        self.kinds.insert(entity, kind);
        self.occupants.entry(location).or_default().push(entity);

        for reg in self.registrations(location) {
            let mut watcher = reg.watcher.borrow_mut();
            watcher.enter(entity, kind);
            watcher.place(
                entity,
                reg.coord,
                self.pressure(entity),
                None,
                self.transitions.get(&entity),
            );
        }
        Ok(())
    }

    /// Detach an entity. Watchers of its location see `exit`.
    ///
    /// Returns the location it was at.
    pub fn remove(&mut self, entity: EntityId) -> Result<LocationId> {
        let location = self
            .locations
            .remove(&entity)
            .ok_or(EngineError::UnknownEntity(entity))?;

        self.kinds.remove(&entity);
        self.transitions.remove(&entity);
        self.pressures.remove(&entity);
        self.detach_occupant(entity, location);

        for reg in self.registrations(location) {
            reg.watcher.borrow_mut().exit(entity);
        }
        Ok(location)
    }

    /// Relocate an entity.
    ///
    /// Moving to the current location is a no-op. Otherwise watchers that
    /// only cover the old location see `exit`, watchers that only cover the
    /// new one see `enter` then `place`, and watchers covering both see a
    /// `place` at the new coordinate.
    pub fn move_entity(&mut self, entity: EntityId, to: LocationId) -> Result<()> {
        let from = self
            .locations
            .get(&entity)
            .copied()
            .ok_or(EngineError::UnknownEntity(entity))?;

        if from == to {
            return Ok(());
        }

        self.detach_occupant(entity, from);
        self.locations.insert(entity, to);
        self.occupants.entry(to).or_default().push(entity);

        let kind = self.kinds.get(&entity).copied().unwrap_or_default();
        let pressure = self.pressure(entity);
        let transition = self.transitions.get(&entity);
        let old = self.registrations(from);
        let new = self.registrations(to);

        for reg in old {
            if !new.iter().any(|n| same_watcher(&n.watcher, &reg.watcher)) {
                reg.watcher.borrow_mut().exit(entity);
            }
        }
        for reg in new {
            let mut watcher = reg.watcher.borrow_mut();
            if !old.iter().any(|o| same_watcher(&o.watcher, &reg.watcher)) {
                watcher.enter(entity, kind);
            }
            watcher.place(entity, reg.coord, pressure, None, transition);
        }
        Ok(())
    }

    /// Register a watcher over a set of locations.
    ///
    /// Every entity already at a newly watched location is replayed to the
    /// watcher as `enter` then `place`. Locations the watcher already covers
    /// are skipped. Call outside the tick/tock window.
    pub fn watch_entities(
        &mut self,
        locations: impl IntoIterator<Item = (LocationId, Coord)>,
        watcher: &SharedWatcher,
    ) {
        for (location, coord) in locations {
            let regs = self.watchers.entry(location).or_default();
            if regs.iter().any(|r| same_watcher(&r.watcher, watcher)) {
                continue;
            }
            regs.push(Registration {
                coord,
                watcher: Rc::clone(watcher),
            });

            let Some(occupants) = self.occupants.get(&location) else {
                continue;
            };
            let mut w = watcher.borrow_mut();
            for &entity in occupants {
                let kind = self.kinds.get(&entity).copied().unwrap_or_default();
                w.enter(entity, kind);
                w.place(
                    entity,
                    coord,
                    self.pressure(entity),
                    None,
                    self.transitions.get(&entity),
                );
            }
        }
    }

    /// Unregister a watcher from a set of locations.
    ///
    /// The watcher sees `exit` for every entity at each location before it
    /// is dropped from that location. Unwatched locations are ignored.
    pub fn unwatch_entities(
        &mut self,
        locations: impl IntoIterator<Item = LocationId>,
        watcher: &SharedWatcher,
    ) {
        for location in locations {
            let Some(regs) = self.watchers.get_mut(&location) else {
                continue;
            };
            let Some(index) = regs.iter().position(|r| same_watcher(&r.watcher, watcher)) else {
                continue;
            };

            if let Some(occupants) = self.occupants.get(&location) {
                let mut w = watcher.borrow_mut();
                for &entity in occupants {
                    w.exit(entity);
                }
            }

            regs.remove(index);
            if regs.is_empty() {
                self.watchers.remove(&location);
            }
        }
    }

    /// Mark an animated effect for the rest of the current turn.
    pub fn transition(&mut self, entity: EntityId, transition: Transition) -> Result<()> {
        if !self.locations.contains_key(&entity) {
            return Err(EngineError::UnknownEntity(entity));
        }
        self.transitions.insert(entity, transition);
        Ok(())
    }

    /// Render one frame.
    ///
    /// Decays pressure toward its target by the time elapsed since the last
    /// frame, then sends `place` to every watcher of every transitioning or
    /// pressed entity. Repeating a frame with the same clock changes nothing.
    pub fn animate(&mut self, progress: &Progress) {
        let decay = self.config.pressure_decay_per_ms;
        let epsilon = self.config.settle_epsilon;

        for pressure in self.pressures.values_mut() {
            let elapsed = pressure.last.map_or(0.0, |last| (progress.now - last).max(0.0));
            pressure.last = Some(progress.now);
            if elapsed > 0.0 {
                pressure.value =
                    pressure.target + (pressure.value - pressure.target) * decay.powf(elapsed);
            }
            if (pressure.value - pressure.target).abs() < epsilon {
                pressure.value = pressure.target;
            }
        }

        let mut active: Vec<EntityId> = self
            .transitions
            .keys()
            .chain(self.pressures.keys())
            .copied()
            .collect();
        active.sort_unstable();
        active.dedup();

        for entity in active {
            let Some(&location) = self.locations.get(&entity) else {
                continue;
            };
            let pressure = self.pressure(entity);
            let transition = self.transitions.get(&entity);
            for reg in self.registrations(location) {
                trace!(%entity, %location, pressure, "animate place");
                reg.watcher
                    .borrow_mut()
                    .place(entity, reg.coord, pressure, Some(progress), transition);
            }
        }
    }

    /// Start pressing an entity; pressure rises toward 1.
    pub fn down(&mut self, entity: EntityId) {
        if !self.locations.contains_key(&entity) {
            warn!(%entity, "down on untracked entity ignored");
            return;
        }
        self.pressures
            .entry(entity)
            .or_insert(Pressure {
                value: 0.0,
                target: 0.0,
                last: None,
            })
            .target = 1.0;
    }

    /// Release an entity; pressure decays toward 0.
    pub fn up(&mut self, entity: EntityId) {
        if let Some(pressure) = self.pressures.get_mut(&entity) {
            pressure.target = 0.0;
        }
    }

    /// Hand an entity's pressure state over to another entity.
    ///
    /// `from` is left unpressed. Nothing happens if `from` is not pressed
    /// or `to` is not placed.
    pub fn transfer_pressure(&mut self, from: EntityId, to: EntityId) {
        if !self.locations.contains_key(&to) {
            return;
        }
        if let Some(pressure) = self.pressures.remove(&from) {
            self.pressures.insert(to, pressure);
        }
    }

    /// Clear this turn's transitions and forget fully released pressure.
    ///
    /// Placements are untouched. Must run before the next turn's
    /// `transition` calls.
    pub fn reset(&mut self) {
        self.transitions.clear();
        self.pressures.retain(|_, p| !p.settled());
    }

    /// Get the location of an entity.
    #[must_use]
    pub fn locate(&self, entity: EntityId) -> Option<LocationId> {
        self.locations.get(&entity).copied()
    }

    /// Get the kind an entity was placed with.
    #[must_use]
    pub fn kind_of(&self, entity: EntityId) -> Option<EntityKind> {
        self.kinds.get(&entity).copied()
    }

    /// Check if the model tracks an entity.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
    }

    /// Entities at a location, in arrival order.
    #[must_use]
    pub fn entities_at(&self, location: LocationId) -> &[EntityId] {
        self.occupants.get(&location).map_or(&[], |v| v.as_slice())
    }

    /// Check if any watcher covers a location.
    #[must_use]
    pub fn is_location_watched(&self, location: LocationId) -> bool {
        self.watchers.contains_key(&location)
    }

    /// Check if any watcher can see an entity where it is now.
    #[must_use]
    pub fn is_watched(&self, entity: EntityId) -> bool {
        self.locate(entity)
            .is_some_and(|location| self.is_location_watched(location))
    }

    /// Current pressure of an entity (0 when never pressed).
    #[must_use]
    pub fn pressure(&self, entity: EntityId) -> f64 {
        self.pressures.get(&entity).map_or(0.0, |p| p.value)
    }

    /// This turn's transition for an entity, if any.
    #[must_use]
    pub fn transition_of(&self, entity: EntityId) -> Option<&Transition> {
        self.transitions.get(&entity)
    }

    /// Get total number of entities tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn registrations(&self, location: LocationId) -> &[Registration] {
        self.watchers.get(&location).map_or(&[], |v| v.as_slice())
    }

    fn detach_occupant(&mut self, entity: EntityId, location: LocationId) {
        if let Some(occupants) = self.occupants.get_mut(&location) {
            occupants.retain(|e| *e != entity);
            if occupants.is_empty() {
                self.occupants.remove(&location);
            }
        }
    }
}

impl fmt::Debug for SpatialViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialViewModel")
            .field("entities", &self.locations.len())
            .field("watched_locations", &self.watchers.len())
            .field("transitions", &self.transitions.len())
            .field("pressed", &self.pressures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::spatial::watcher::{Stage, Watcher};

    #[derive(Debug, Clone, PartialEq)]
    enum Note {
        Enter(EntityId),
        Exit(EntityId),
        Place(EntityId, Coord),
    }

    #[derive(Default)]
    struct Log(Vec<Note>);

    impl Watcher for Log {
        fn enter(&mut self, entity: EntityId, _: EntityKind) {
            self.0.push(Note::Enter(entity));
        }
        fn exit(&mut self, entity: EntityId) {
            self.0.push(Note::Exit(entity));
        }
        fn place(&mut self, entity: EntityId, coord: Coord, _: f64, _: Option<&Progress>, _: Option<&Transition>) {
            self.0.push(Note::Place(entity, coord));
        }
    }

    fn log() -> (Rc<RefCell<Log>>, SharedWatcher) {
        let log = Rc::new(RefCell::new(Log::default()));
        let watcher: SharedWatcher = log.clone();
        (log, watcher)
    }

    const A: LocationId = LocationId(1);
    const B: LocationId = LocationId(2);
    const C: Coord = Coord::new(0, 0, 0);
    const D: Coord = Coord::new(1, 0, 0);

    #[test]
    fn test_put_and_locate() {
        let mut model = SpatialViewModel::default();
        model.put(EntityId(10), A, EntityKind(1)).unwrap();

        assert_eq!(model.locate(EntityId(10)), Some(A));
        assert_eq!(model.kind_of(EntityId(10)), Some(EntityKind(1)));
        assert_eq!(model.entities_at(A), &[EntityId(10)]);
        assert_eq!(model.locate(EntityId(99)), None);
    }

    #[test]
    fn test_duplicate_put_fails() {
        let mut model = SpatialViewModel::default();
        model.put(EntityId(10), A, EntityKind(1)).unwrap();

        let err = model.put(EntityId(10), B, EntityKind(1)).unwrap_err();
        assert_eq!(err, EngineError::DuplicateEntity(EntityId(10)));
        assert_eq!(model.locate(EntityId(10)), Some(A));
    }

    #[test]
    fn test_remove_unknown_fails() {
        let mut model = SpatialViewModel::default();
        assert_eq!(
            model.remove(EntityId(3)),
            Err(EngineError::UnknownEntity(EntityId(3)))
        );
        assert_eq!(
            model.move_entity(EntityId(3), A),
            Err(EngineError::UnknownEntity(EntityId(3)))
        );
    }

    #[test]
    fn test_watch_replays_occupants() {
        let mut model = SpatialViewModel::default();
        model.put(EntityId(10), A, EntityKind(1)).unwrap();
        model.put(EntityId(11), A, EntityKind(1)).unwrap();

        let (log, watcher) = log();
        model.watch_entities([(A, C)], &watcher);

        assert_eq!(
            log.borrow().0,
            vec![
                Note::Enter(EntityId(10)),
                Note::Place(EntityId(10), C),
                Note::Enter(EntityId(11)),
                Note::Place(EntityId(11), C),
            ]
        );
    }

    #[test]
    fn test_duplicate_watch_is_ignored() {
        let mut model = SpatialViewModel::default();
        model.put(EntityId(10), A, EntityKind(1)).unwrap();

        let (log, watcher) = log();
        model.watch_entities([(A, C)], &watcher);
        model.watch_entities([(A, C)], &watcher);

        assert_eq!(log.borrow().0.len(), 2);
    }

    #[test]
    fn test_unwatch_exits_occupants() {
        let mut model = SpatialViewModel::default();
        model.put(EntityId(10), A, EntityKind(1)).unwrap();

        let (log, watcher) = log();
        model.watch_entities([(A, C)], &watcher);
        log.borrow_mut().0.clear();

        model.unwatch_entities([A], &watcher);
        assert_eq!(log.borrow().0, vec![Note::Exit(EntityId(10))]);
        assert!(!model.is_location_watched(A));

        // No further notifications once unwatched.
        model.remove(EntityId(10)).unwrap();
        assert_eq!(log.borrow().0.len(), 1);
    }

    #[test]
    fn test_move_same_location_is_silent() {
        let mut model = SpatialViewModel::default();
        let (log, watcher) = log();
        model.watch_entities([(A, C)], &watcher);
        model.put(EntityId(10), A, EntityKind(1)).unwrap();
        log.borrow_mut().0.clear();

        model.move_entity(EntityId(10), A).unwrap();
        assert!(log.borrow().0.is_empty());
    }

    #[test]
    fn test_move_between_watchers() {
        let mut model = SpatialViewModel::default();
        let (left, left_watcher) = log();
        let (right, right_watcher) = log();
        let (both, both_watcher) = log();
        model.watch_entities([(A, C)], &left_watcher);
        model.watch_entities([(B, D)], &right_watcher);
        model.watch_entities([(A, C), (B, D)], &both_watcher);

        model.put(EntityId(10), A, EntityKind(1)).unwrap();
        left.borrow_mut().0.clear();
        both.borrow_mut().0.clear();

        model.move_entity(EntityId(10), B).unwrap();

        assert_eq!(left.borrow().0, vec![Note::Exit(EntityId(10))]);
        assert_eq!(
            right.borrow().0,
            vec![Note::Enter(EntityId(10)), Note::Place(EntityId(10), D)]
        );
        assert_eq!(both.borrow().0, vec![Note::Place(EntityId(10), D)]);
        assert!(model.entities_at(A).is_empty());
    }

    #[test]
    fn test_transition_requires_placement() {
        let mut model = SpatialViewModel::default();
        assert!(model.transition(EntityId(1), Transition::entering()).is_err());

        model.put(EntityId(1), A, EntityKind(1)).unwrap();
        model.transition(EntityId(1), Transition::entering()).unwrap();
        assert_eq!(
            model.transition_of(EntityId(1)).and_then(|t| t.stage),
            Some(Stage::Enter)
        );

        model.reset();
        assert!(model.transition_of(EntityId(1)).is_none());
        assert_eq!(model.locate(EntityId(1)), Some(A));
    }

    #[test]
    fn test_animate_places_transitioning_entities_only() {
        let mut model = SpatialViewModel::default();
        let (log, watcher) = log();
        model.watch_entities([(A, C)], &watcher);
        model.put(EntityId(1), A, EntityKind(1)).unwrap();
        model.put(EntityId(2), A, EntityKind(1)).unwrap();
        model.transition(EntityId(2), Transition::bounce(crate::core::Direction::North)).unwrap();
        log.borrow_mut().0.clear();

        model.animate(&Progress::at(0.0, 0.5));
        assert_eq!(log.borrow().0, vec![Note::Place(EntityId(2), C)]);
    }

    #[test]
    fn test_pressure_rises_and_settles() {
        let mut model = SpatialViewModel::default();
        model.put(EntityId(1), A, EntityKind(1)).unwrap();

        model.down(EntityId(1));
        model.animate(&Progress::at(0.0, 0.0));
        model.animate(&Progress::at(100.0, 0.0));
        let held = model.pressure(EntityId(1));
        assert!(held > 0.5 && held < 1.0, "pressure {held}");

        // Same clock: no change.
        model.animate(&Progress::at(100.0, 0.0));
        assert_eq!(model.pressure(EntityId(1)), held);

        model.up(EntityId(1));
        model.animate(&Progress::at(2000.0, 0.0));
        assert_eq!(model.pressure(EntityId(1)), 0.0);

        model.reset();
        model.up(EntityId(1));
        assert_eq!(model.pressure(EntityId(1)), 0.0);
    }

    #[test]
    fn test_down_on_unknown_is_ignored() {
        let mut model = SpatialViewModel::default();
        model.down(EntityId(5));
        model.up(EntityId(5));
        assert_eq!(model.pressure(EntityId(5)), 0.0);
    }

    #[test]
    fn test_transfer_pressure_moves_state() {
        let mut model = SpatialViewModel::default();
        model.put(EntityId(1), A, EntityKind(1)).unwrap();
        model.put(EntityId(2), A, EntityKind(2)).unwrap();

        model.down(EntityId(1));
        model.animate(&Progress::at(0.0, 0.0));
        model.animate(&Progress::at(300.0, 0.0));
        let held = model.pressure(EntityId(1));

        model.transfer_pressure(EntityId(1), EntityId(2));
        assert_eq!(model.pressure(EntityId(2)), held);
        assert_eq!(model.pressure(EntityId(1)), 0.0);

        // The target travels too: releasing the new holder lets it settle.
        model.up(EntityId(2));
        model.animate(&Progress::at(5000.0, 0.0));
        assert_eq!(model.pressure(EntityId(2)), 0.0);

        // Unplaced receivers are ignored.
        model.down(EntityId(2));
        model.transfer_pressure(EntityId(2), EntityId(9));
        assert!(model.pressures.contains_key(&EntityId(2)));
        assert!(!model.pressures.contains_key(&EntityId(9)));
    }
}
