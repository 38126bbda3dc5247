//! World layer: turn simulation over a topology and pluggable mechanics.
//!
//! ## Key Types
//!
//! - `WorldModel`: entities, inventories, intents and the turn cycle
//! - `Topology`: adjacency supplied by the caller (`GridTopology` built in)
//! - `Mechanics`: what bumps and crafting do (`MechanicsTable` built in)
//! - `Kit`: the world as seen by interaction handlers
//! - `hold_auction`: one winner per contested tile
//!
//! ## Usage
//!
//! ```
//! use tile_world::core::{Direction, EntityKind, WorldConfig};
//! use tile_world::world::{fell_patient, BumpPattern, GridTopology, MechanicsTable, WorldModel};
//!
//! const LUMBERJACK: EntityKind = EntityKind(1);
//! const TREE: EntityKind = EntityKind(2);
//!
//! let grid = GridTopology::new(2, 1);
//! let mut mechanics = MechanicsTable::new();
//! mechanics.on(BumpPattern::any().agent(LUMBERJACK).patient(TREE), fell_patient);
//!
//! let mut world = WorldModel::new(grid, mechanics, WorldConfig::default());
//! let jack = world.spawn(LUMBERJACK, grid.location(0, 0).unwrap()).unwrap();
//! let tree = world.spawn(TREE, grid.location(1, 0).unwrap()).unwrap();
//!
//! world.intend(jack, Some(Direction::East), true).unwrap();
//! let report = world.tick().unwrap();
//! assert_eq!(report.removed, vec![tree]);
//! world.tock().unwrap();
//! assert_eq!(world.entity_at(grid.location(1, 0).unwrap()), None);
//! ```

pub mod auction;
pub mod inventory;
pub mod mechanics;
pub mod model;
pub mod snapshot;
pub mod topology;

pub use auction::{hold_auction, Award, Bid, Intent};
pub use inventory::{Inventory, INVENTORY_SLOTS, LEFT_HAND, RIGHT_HAND};
pub use mechanics::{
    fell_patient, take_patient, Bump, BumpOutcome, BumpPattern, CraftOutcome, Interaction, Kit,
    Mechanics, MechanicsTable,
};
pub use model::{BumpRecord, TurnReport, WorldModel};
pub use snapshot::{EntitySnapshot, WorldSnapshot};
pub use topology::{Advance, Cursor, GridTopology, Topology};
