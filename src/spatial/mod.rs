//! Spatial layer: where entities are and who is looking.
//!
//! ## Key Types
//!
//! - `SpatialViewModel`: entity placement and per-location watcher index
//! - `Watcher`: the contract every renderer implements
//! - `Transition`: how an entity animates through the current turn
//! - `Progress`: per-frame animation clock

pub mod model;
pub mod progress;
pub mod watcher;

pub use model::SpatialViewModel;
pub use progress::Progress;
pub use watcher::{shared, Coord, SharedWatcher, Stage, Transition, Watcher};
