//! Entity identification.
//!
//! Every placeable thing (agent, item, UI glyph) is named by an `EntityId`.
//! Ids are opaque: the engine never derives meaning from the number itself.
//!
//! ## Two id spaces
//!
//! Callers of the [`MacroViewModel`](crate::macro_view::MacroViewModel) use
//! *external* ids. The view model binds each one to an *internal* id that it
//! allocates itself, and rebinds it whenever the entity's representation is
//! replaced. Both spaces use this same type.
//!
//! ```
//! use tile_world::core::{EntityId, EntityKind};
//!
//! let agent = EntityId(7);
//! assert_eq!(agent.raw(), 7);
//! assert!(EntityKind::EMPTY.is_empty());
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a placeable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Content type of an entity or inventory item.
///
/// Game content tables assign meaning; the engine only compares kinds.
/// Kind `0` is reserved for "nothing here" so that an empty hand can take
/// part in interaction lookups like any other item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKind(pub u32);

impl EntityKind {
    /// The empty kind, used for vacant inventory slots.
    pub const EMPTY: Self = Self(0);

    /// Create an entity kind.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check whether this is the empty kind.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Kind({})", self.0)
    }
}

/// Active status effect on an agent (e.g. "burning", "invisible").
///
/// `EffectKind::NONE` means no effect is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectKind(pub u32);

impl EffectKind {
    /// No active effect.
    pub const NONE: Self = Self(0);

    /// Create an effect kind.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}
