//! The tile auction.
//!
//! Every turn, each entity that wants to move bids for the tile in front of
//! it. Bids are grouped by destination and each destination is awarded to
//! one shuffled bidder. Awards are judged against the occupancy at the
//! start of the turn only, so the outcome does not depend on the order the
//! destinations are visited in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Direction, EntityId, LocationId, WorldRng};

/// What an entity wants to do this turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// `None` stays put and produces no bid.
    pub direction: Option<Direction>,
    /// Interact with an occupant instead of just walking.
    pub deliberate: bool,
}

impl Intent {
    #[must_use]
    pub fn toward(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            deliberate: false,
        }
    }
}

/// An intent resolved against the topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub entity: EntityId,
    pub origin: LocationId,
    pub direction: Direction,
    pub destination: LocationId,
    /// Quarter turns picked up crossing to the destination.
    pub turn: i32,
    /// The step crosses a topology seam.
    pub transit: bool,
    pub deliberate: bool,
}

/// Outcome of one bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Award {
    /// Won a tile that was vacant at the start of the turn.
    Move(Bid),
    /// Lost, or won an occupied tile without meaning to interact.
    Bounce(Bid),
    /// Won an occupied tile deliberately: bounce, then bump `patient`.
    Bump { bid: Bid, patient: EntityId },
}

/// Award every destination to at most one bidder.
///
/// `occupant` reports who stood on a tile when the turn began. Destinations
/// are visited in location order and bidders are shuffled with `rng`, so a
/// fixed seed and fixed bid list give a fixed result.
pub fn hold_auction(
    bids: impl IntoIterator<Item = Bid>,
    occupant: impl Fn(LocationId) -> Option<EntityId>,
    rng: &mut WorldRng,
) -> Vec<Award> {
    let mut buckets: BTreeMap<LocationId, SmallVec<[Bid; 4]>> = BTreeMap::new();
    for bid in bids {
        buckets.entry(bid.destination).or_default().push(bid);
    }

    let mut awards = Vec::new();
    for (destination, mut bidders) in buckets {
        rng.shuffle(&mut bidders);
        let mut bidders = bidders.into_iter();
        let Some(winner) = bidders.next() else {
            continue;
        };

        let award = match occupant(destination) {
            None => Award::Move(winner),
            Some(patient) if winner.deliberate => Award::Bump {
                bid: winner,
                patient,
            },
            Some(_) => Award::Bounce(winner),
        };
        awards.push(award);
        awards.extend(bidders.map(Award::Bounce));
    }
    awards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(entity: u32, origin: u32, destination: u32, deliberate: bool) -> Bid {
        Bid {
            entity: EntityId(entity),
            origin: LocationId(origin),
            direction: Direction::East,
            destination: LocationId(destination),
            turn: 0,
            transit: false,
            deliberate,
        }
    }

    #[test]
    fn test_uncontested_vacant_tile_moves() {
        let mut rng = WorldRng::new(1);
        let awards = hold_auction([bid(1, 0, 1, false)], |_| None, &mut rng);
        assert_eq!(awards, vec![Award::Move(bid(1, 0, 1, false))]);
    }

    #[test]
    fn test_contested_vacant_tile_has_one_winner() {
        let mut rng = WorldRng::new(1);
        let awards = hold_auction(
            [bid(1, 0, 5, false), bid(2, 4, 5, false), bid(3, 6, 5, true)],
            |_| None,
            &mut rng,
        );
        let moves = awards.iter().filter(|a| matches!(a, Award::Move(_))).count();
        let bounces = awards.iter().filter(|a| matches!(a, Award::Bounce(_))).count();
        assert_eq!((moves, bounces), (1, 2));
    }

    #[test]
    fn test_occupied_tile_nobody_moves() {
        let mut rng = WorldRng::new(1);
        let awards = hold_auction(
            [bid(1, 0, 5, false), bid(2, 4, 5, false)],
            |location| (location == LocationId(5)).then_some(EntityId(9)),
            &mut rng,
        );
        assert!(awards.iter().all(|a| matches!(a, Award::Bounce(_))));
    }

    #[test]
    fn test_deliberate_winner_bumps_occupant() {
        let mut rng = WorldRng::new(1);
        let awards = hold_auction(
            [bid(1, 0, 5, true)],
            |_| Some(EntityId(9)),
            &mut rng,
        );
        assert_eq!(
            awards,
            vec![Award::Bump {
                bid: bid(1, 0, 5, true),
                patient: EntityId(9),
            }]
        );
    }

    #[test]
    fn test_same_seed_same_winner() {
        let bids = [bid(1, 0, 5, false), bid(2, 4, 5, false), bid(3, 6, 5, false)];
        let first = hold_auction(bids, |_| None, &mut WorldRng::new(77));
        let second = hold_auction(bids, |_| None, &mut WorldRng::new(77));
        assert_eq!(first, second);
    }
}
