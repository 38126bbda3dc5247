//! Core engine types: ids, directions, RNG, configuration, errors.
//!
//! Everything here is shared by the spatial, macro-view and world layers
//! and carries no game content.

pub mod entity;
pub mod location;
pub mod rng;
pub mod config;
pub mod error;

pub use entity::{EntityId, EntityKind, EffectKind};
pub use location::{LocationId, Direction};
pub use rng::{WorldRng, WorldRngState};
pub use config::{IdConfig, ViewConfig, WorldConfig};
pub use error::{EngineError, Result};
