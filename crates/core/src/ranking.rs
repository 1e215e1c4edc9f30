//! Proximity ranking of present people for a single task location.
//!
//! A pair survives filtering when it connects the task's own location to
//! an occupied location. Surviving pairs are sorted by ascending distance
//! (stable, so ties keep load order) and walked to produce a deduplicated
//! list of person ids.

use std::collections::HashMap;

use crate::distance::DistancePair;
use crate::presence::Occupant;
use crate::types::DbId;

/// Where each endpoint of a pair stands relative to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EndpointClass {
    own: bool,
    occupied: bool,
}

/// A pair kept for ranking, with the occupant found at each endpoint.
#[derive(Debug, Clone)]
pub struct RankedPair<'a> {
    pub pair: &'a DistancePair,
    pub from_occupant: Option<&'a Occupant>,
    pub to_occupant: Option<&'a Occupant>,
    from_is_own: bool,
    to_is_own: bool,
}

impl<'a> RankedPair<'a> {
    /// Occupants in the order they should be offered the task: the
    /// non-own endpoint first, then the own endpoint. For a self-pair both
    /// endpoints are the own location and `from` comes first.
    pub fn occupants_in_order(&self) -> impl Iterator<Item = &'a Occupant> {
        let (first, second) = if self.from_is_own && !self.to_is_own {
            (self.to_occupant, self.from_occupant)
        } else {
            (self.from_occupant, self.to_occupant)
        };
        first.into_iter().chain(second)
    }
}

/// Index occupants by location, keeping the first occupant per location.
fn index_occupants(occupants: &[Occupant]) -> HashMap<&str, &Occupant> {
    let mut index: HashMap<&str, &Occupant> = HashMap::new();
    for occ in occupants {
        index.entry(occ.location_external_id.as_str()).or_insert(occ);
    }
    index
}

fn keep(from: EndpointClass, to: EndpointClass) -> bool {
    match (from.own, to.own) {
        (true, false) => to.occupied,
        (false, true) => from.occupied,
        (true, true) => from.occupied || to.occupied,
        (false, false) => false,
    }
}

/// Filter and sort the floor's pairs for a task at `task_location`.
pub fn rank_pairs<'a>(
    task_location: &str,
    pairs: &'a [DistancePair],
    occupants: &'a [Occupant],
) -> Vec<RankedPair<'a>> {
    let index = index_occupants(occupants);

    let mut kept: Vec<RankedPair<'a>> = pairs
        .iter()
        .filter_map(|pair| {
            let from_occ = index.get(pair.from.external_id.as_str()).copied();
            let to_occ = index.get(pair.to.external_id.as_str()).copied();
            let from = EndpointClass {
                own: pair.from.external_id == task_location,
                occupied: from_occ.is_some(),
            };
            let to = EndpointClass {
                own: pair.to.external_id == task_location,
                occupied: to_occ.is_some(),
            };
            keep(from, to).then_some(RankedPair {
                pair,
                from_occupant: from_occ,
                to_occupant: to_occ,
                from_is_own: from.own,
                to_is_own: to.own,
            })
        })
        .collect();

    kept.sort_by(|a, b| a.pair.distance.total_cmp(&b.pair.distance));
    kept
}

/// Ordered, deduplicated person ids for a task at `task_location`.
///
/// Occupants the directory could not resolve to an internal id are
/// skipped: they cannot be stored as candidates.
pub fn rank_candidates(
    task_location: &str,
    pairs: &[DistancePair],
    occupants: &[Occupant],
) -> Vec<DbId> {
    let mut candidates: Vec<DbId> = Vec::new();
    for ranked in rank_pairs(task_location, pairs, occupants) {
        for occ in ranked.occupants_in_order() {
            if let Some(id) = occ.person_id {
                if !candidates.contains(&id) {
                    candidates.push(id);
                }
            }
        }
    }
    candidates
}
