//! Locations and directions.
//!
//! A `LocationId` names one discrete cell: a world tile, or a cell of a UI
//! panel such as the control pad. Adjacency between locations is not known
//! here; it comes from a [`Topology`](crate::world::Topology).

use serde::{Deserialize, Serialize};

/// Opaque identifier for a discrete cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationId(pub u32);

impl LocationId {
    /// Create a location ID.
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

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Location({})", self.0)
    }
}

/// Cardinal direction, clockwise from north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four directions in clockwise order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Quarter turns clockwise from north (0..4).
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Direction from a number of quarter turns, taken modulo 4.
    #[must_use]
    pub const fn from_quarter_turns(turns: i32) -> Self {
        Self::ALL[turns.rem_euclid(4) as usize]
    }

    /// Rotate clockwise by `turns` quarter turns (negative is anticlockwise).
    #[must_use]
    pub const fn rotate(self, turns: i32) -> Self {
        Self::from_quarter_turns(self.quarter_turns() as i32 + turns)
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.rotate(2)
    }
}
