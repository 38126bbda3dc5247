//! The watcher contract and the values it receives.
//!
//! Renderers implement [`Watcher`] and register it over the locations they
//! display. A full map, a control pad and a single-button widget are all
//! just watchers over different location sets; none of them knows about the
//! others.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::{Direction, EntityId, EntityKind};

use super::progress::Progress;

/// Presentation position of a location as one watcher sees it.
///
/// The same location may sit at different coordinates in different views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    /// Orientation in quarter turns.
    pub a: i32,
}

impl Coord {
    #[must_use]
    pub const fn new(x: i32, y: i32, a: i32) -> Self {
        Self { x, y, a }
    }
}

/// Which end of its life an entity is animating this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Appearing (fade or grow in).
    Enter,
    /// Disappearing (fade or shrink out).
    Exit,
    /// Present at both ends of the turn.
    Stay,
}

/// How an entity animates through the current turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// Direction of travel, if the entity travels or leans.
    pub direction: Option<Direction>,
    /// Quarter turns of rotation applied over the turn.
    pub rotation: i32,
    /// Lean toward `direction` and come back instead of arriving.
    pub bump: bool,
    pub stage: Option<Stage>,
    /// Topple over while exiting.
    pub tumble: bool,
}

impl Transition {
    /// Travel toward `direction`, turning by `rotation`.
    #[must_use]
    pub const fn moving(direction: Direction, rotation: i32) -> Self {
        Self {
            direction: Some(direction),
            rotation,
            bump: false,
            stage: None,
            tumble: false,
        }
    }

    /// Lean toward `direction` and return.
    #[must_use]
    pub const fn bounce(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            rotation: 0,
            bump: true,
            stage: None,
            tumble: false,
        }
    }

    /// Appear in place.
    #[must_use]
    pub const fn entering() -> Self {
        Self {
            direction: None,
            rotation: 0,
            bump: false,
            stage: Some(Stage::Enter),
            tumble: false,
        }
    }

    /// Disappear in place.
    #[must_use]
    pub const fn exiting() -> Self {
        Self {
            direction: None,
            rotation: 0,
            bump: false,
            stage: Some(Stage::Exit),
            tumble: false,
        }
    }

    /// The fixed topple used when an entity is felled.
    #[must_use]
    pub const fn tumble() -> Self {
        Self {
            direction: None,
            rotation: 1,
            bump: false,
            stage: Some(Stage::Exit),
            tumble: true,
        }
    }

    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Observer of a set of locations.
///
/// For every entity at a watched location the watcher sees `enter` before
/// any `place`, and `exit` last.
pub trait Watcher {
    /// An entity became visible to this watcher.
    fn enter(&mut self, entity: EntityId, kind: EntityKind);

    /// An entity is no longer visible to this watcher.
    fn exit(&mut self, entity: EntityId);

    /// Position (and, during a turn, animate) an entity.
    ///
    /// `progress` is `None` outside of `animate` frames.
    fn place(
        &mut self,
        entity: EntityId,
        coord: Coord,
        pressure: f64,
        progress: Option<&Progress>,
        transition: Option<&Transition>,
    );
}

/// Watchers are shared between the model and the view that owns them.
pub type SharedWatcher = Rc<RefCell<dyn Watcher>>;

/// Wrap a watcher for registration.
pub fn shared<W: Watcher + 'static>(watcher: W) -> Rc<RefCell<W>> {
    Rc::new(RefCell::new(watcher))
}

/// Pointer identity, ignoring vtables.
pub(crate) fn same_watcher(a: &SharedWatcher, b: &SharedWatcher) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}
