//! Engine error type.
//!
//! Every variant is a caller or bookkeeping fault. Topology boundaries and
//! unmatched interactions are ordinary outcomes and never surface here.

use thiserror::Error;

use super::entity::EntityId;
use super::location::LocationId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("entity already placed: {0}")]
    DuplicateEntity(EntityId),

    #[error("entity not tracked: {0}")]
    UnknownEntity(EntityId),

    #[error("`{command}` issued outside the planning phase")]
    PlanningPhaseViolation { command: &'static str },

    #[error("location already occupied: {0}")]
    LocationOccupied(LocationId),

    #[error("inventory slot {slot} out of range for {entity}")]
    InventorySlot { entity: EntityId, slot: usize },

    #[error("bookkeeping diverged: {0}")]
    Bookkeeping(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
