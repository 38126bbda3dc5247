//! # tile-world
//!
//! A turn-based tile world with an animated view layer.
//!
//! ## Design Principles
//!
//! 1. **Plan, then animate**: Every turn is planned (intents, commands),
//!    resolved in one `tick`, animated frame by frame, and committed by
//!    `tock`. Structural view changes wait for the commit.
//!
//! 2. **Content Is Pluggable**: Adjacency comes from a `Topology` and
//!    interactions from `Mechanics`. The engine hardcodes neither.
//!
//! 3. **Deterministic**: All randomness flows through a seeded `WorldRng`,
//!    so a seed and a command sequence replay exactly.
//!
//! ## Architecture
//!
//! - **Watchers**: Renderers register per location and receive
//!   enter/exit/place callbacks only for what they can see.
//!
//! - **Two Id Spaces**: The macro view hands out internal ids so an entity
//!   can be replaced by a new representation while the old one animates
//!   out, without the caller's id changing.
//!
//! - **Tile Auction**: Contested tiles go to one shuffled bidder, judged
//!   against occupancy at the start of the turn.
//!
//! ## Modules
//!
//! - `core`: Ids, directions, RNG, configuration, errors
//! - `spatial`: Entity placement, watchers, transitions, pressure
//! - `macro_view`: Command vocabulary and turn phases over `spatial`
//! - `world`: Turn simulation, topology, mechanics, inventories

pub mod core;
pub mod spatial;
pub mod macro_view;
pub mod world;

// Re-export commonly used types
pub use crate::core::{
    Direction, EffectKind, EngineError, EntityId, EntityKind, LocationId, Result,
    WorldConfig, WorldRng,
};
pub use crate::spatial::{Coord, Progress, SharedWatcher, SpatialViewModel, Transition, Watcher};
pub use crate::macro_view::{MacroViewModel, Phase};
pub use crate::world::{GridTopology, Mechanics, MechanicsTable, Topology, TurnReport, WorldModel};
