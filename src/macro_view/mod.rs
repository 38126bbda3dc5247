//! Macro view layer: command vocabulary over a spatial view model.
//!
//! ## Key Types
//!
//! - `MacroViewModel`: external ids, staged commands, plan/animate phases
//! - `IdAllocator`: per-instance internal id counter
//! - `Press`: release token returned by `down`

pub mod ids;
pub mod model;

pub use ids::IdAllocator;
pub use model::{MacroViewModel, Phase, Press};
