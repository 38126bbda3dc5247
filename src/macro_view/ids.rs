//! Internal id allocation.

use serde::{Deserialize, Serialize};

use crate::core::config::IdConfig;
use crate::core::EntityId;

/// Monotonic id counter with a configurable start and stride.
///
/// ```
/// use tile_world::core::{EntityId, IdConfig};
/// use tile_world::macro_view::IdAllocator;
///
/// // Two view models interleaving odd and even ids.
/// let mut odd = IdAllocator::new(IdConfig::new(1, 2));
/// let mut even = IdAllocator::new(IdConfig::new(2, 2));
/// assert_eq!(odd.allocate(), EntityId(1));
/// assert_eq!(even.allocate(), EntityId(2));
/// assert_eq!(odd.allocate(), EntityId(3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
    stride: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(IdConfig::default())
    }
}

impl IdAllocator {
    #[must_use]
    pub fn new(config: IdConfig) -> Self {
        Self {
            next: config.start,
            stride: config.stride.max(1),
        }
    }

    /// Hand out the next id.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.wrapping_add(self.stride);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_with_stride() {
        let mut ids = IdAllocator::new(IdConfig::new(10, 5));
        assert_eq!(ids.allocate(), EntityId(10));
        assert_eq!(ids.allocate(), EntityId(15));
        assert_eq!(ids.allocate(), EntityId(20));
    }

    #[test]
    fn test_interleaved_allocators_never_collide() {
        let mut a = IdAllocator::new(IdConfig::new(0, 3));
        let mut b = IdAllocator::new(IdConfig::new(1, 3));
        let mut c = IdAllocator::new(IdConfig::new(2, 3));

        let mut all: Vec<EntityId> = (0..50)
            .flat_map(|_| [a.allocate(), b.allocate(), c.allocate()])
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
