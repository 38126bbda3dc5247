//! Adjacency between locations.
//!
//! The world never computes neighbors itself. It asks a [`Topology`], which
//! may be anything from a flat rectangle to the faces of a cube whose seams
//! rotate the traveller.

use serde::{Deserialize, Serialize};

use crate::core::{Direction, LocationId};
use crate::spatial::Coord;

/// A position and a heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    pub position: LocationId,
    pub direction: Direction,
}

/// Where a step from a cursor lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Advance {
    pub position: LocationId,
    /// Heading after the step (differs from the input across a seam).
    pub direction: Direction,
    /// Quarter turns the traveller rotates by.
    pub turn: i32,
    /// The step crosses a seam that presentation cannot interpolate.
    pub transit: bool,
}

/// Neighbor lookup. Must be pure.
pub trait Topology {
    /// Step one cell from `cursor`, or `None` at a boundary.
    fn advance(&self, cursor: Cursor) -> Option<Advance>;
}

impl<F> Topology for F
where
    F: Fn(Cursor) -> Option<Advance>,
{
    fn advance(&self, cursor: Cursor) -> Option<Advance> {
        self(cursor)
    }
}

/// Bounded rectangle with row-major location ids.
///
/// Location `y * width + x`; north is decreasing `y`. Stepping off an edge
/// yields `None`.
///
/// ```
/// use tile_world::core::{Direction, LocationId};
/// use tile_world::world::{Cursor, GridTopology, Topology};
///
/// let grid = GridTopology::new(3, 2);
/// let step = grid.advance(Cursor { position: LocationId(0), direction: Direction::East });
/// assert_eq!(step.map(|a| a.position), Some(LocationId(1)));
/// assert!(grid.advance(Cursor { position: LocationId(0), direction: Direction::North }).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTopology {
    width: u32,
    height: u32,
}

impl GridTopology {
    /// Panics on a zero-sized grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Grid must have at least one cell");
        Self { width, height }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Location at column `x`, row `y`, if inside the grid.
    #[must_use]
    pub fn location(&self, x: u32, y: u32) -> Option<LocationId> {
        (x < self.width && y < self.height).then(|| LocationId(y * self.width + x))
    }

    /// Column and row of a location, if inside the grid.
    #[must_use]
    pub fn position(&self, location: LocationId) -> Option<(u32, u32)> {
        (location.0 < self.width * self.height)
            .then(|| (location.0 % self.width, location.0 / self.width))
    }

    /// Every cell with its natural coordinate, for whole-map watchers.
    pub fn cells(&self) -> impl Iterator<Item = (LocationId, Coord)> + '_ {
        (0..self.width * self.height).map(move |raw| {
            let x = (raw % self.width) as i32;
            let y = (raw / self.width) as i32;
            (LocationId(raw), Coord::new(x, y, 0))
        })
    }
}

impl Topology for GridTopology {
    fn advance(&self, cursor: Cursor) -> Option<Advance> {
        let (x, y) = self.position(cursor.position)?;
        let (x, y) = match cursor.direction {
            Direction::North => (Some(x), y.checked_sub(1)),
            Direction::East => (x.checked_add(1), Some(y)),
            Direction::South => (Some(x), y.checked_add(1)),
            Direction::West => (x.checked_sub(1), Some(y)),
        };
        let position = self.location(x?, y?)?;
        Some(Advance {
            position,
            direction: cursor.direction,
            turn: 0,
            transit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(grid: &GridTopology, raw: u32, direction: Direction) -> Option<u32> {
        grid.advance(Cursor {
            position: LocationId(raw),
            direction,
        })
        .map(|a| a.position.0)
    }

    #[test]
    fn test_grid_neighbors() {
        let grid = GridTopology::new(3, 3);
        assert_eq!(step(&grid, 4, Direction::North), Some(1));
        assert_eq!(step(&grid, 4, Direction::East), Some(5));
        assert_eq!(step(&grid, 4, Direction::South), Some(7));
        assert_eq!(step(&grid, 4, Direction::West), Some(3));
    }

    #[test]
    fn test_grid_boundaries() {
        let grid = GridTopology::new(3, 3);
        assert_eq!(step(&grid, 0, Direction::West), None);
        assert_eq!(step(&grid, 2, Direction::East), None);
        assert_eq!(step(&grid, 8, Direction::South), None);
        assert_eq!(step(&grid, 99, Direction::North), None);
    }

    #[test]
    fn test_closure_topology() {
        // A two-cell ring whose seam flips the traveller around.
        let ring = |cursor: Cursor| {
            Some(Advance {
                position: LocationId(1 - cursor.position.0),
                direction: cursor.direction.opposite(),
                turn: 2,
                transit: true,
            })
        };
        let advance = ring
            .advance(Cursor {
                position: LocationId(0),
                direction: Direction::East,
            })
            .unwrap();
        assert_eq!(advance.position, LocationId(1));
        assert_eq!(advance.direction, Direction::West);
        assert!(advance.transit);
    }

    #[test]
    fn test_cells_cover_grid() {
        let grid = GridTopology::new(4, 2);
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[5], (LocationId(5), Coord::new(1, 1, 0)));
    }
}
