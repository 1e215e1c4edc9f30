//! Straight-line distance matrix per floor.
//!
//! For a floor with locations `l_0..l_{n-1}` the matrix stores one record
//! per unordered pair `(i, j)` with `i < j`, plus one zero-distance
//! self-pair per location, for `n(n+1)/2` records in total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::types::Floor;

/// One endpoint of a stored distance pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairEndpoint {
    /// External (booking service) identifier of the location.
    pub external_id: String,
    pub label: String,
}

impl From<&Location> for PairEndpoint {
    fn from(loc: &Location) -> Self {
        Self {
            external_id: loc.external_id.clone(),
            label: loc.name.clone(),
        }
    }
}

/// A persisted distance between two locations sharing a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistancePair {
    pub from: PairEndpoint,
    pub to: PairEndpoint,
    pub distance: f64,
    pub floor: Floor,
}

impl DistancePair {
    pub fn is_self_pair(&self) -> bool {
        self.from.external_id == self.to.external_id
    }
}

/// Distance pairs grouped by floor.
pub type DistancesByFloor = BTreeMap<Floor, Vec<DistancePair>>;

/// Euclidean distance between two locations.
pub fn euclidean(a: &Location, b: &Location) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Number of stored pairs for a floor with `n` locations.
pub fn expected_pair_count(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Discard unrankable locations and group the rest by floor, keeping the
/// input order within each floor.
pub fn group_by_floor(locations: impl IntoIterator<Item = Location>) -> BTreeMap<Floor, Vec<Location>> {
    let mut grouped: BTreeMap<Floor, Vec<Location>> = BTreeMap::new();
    for loc in locations.into_iter().filter(Location::is_rankable) {
        grouped.entry(loc.floor).or_default().push(loc);
    }
    grouped
}

/// Compute every pair for one floor: the `i < j` pairs first, then the
/// self-pairs.
pub fn floor_pairs(floor: Floor, locations: &[Location]) -> Vec<DistancePair> {
    let mut pairs = Vec::with_capacity(expected_pair_count(locations.len()));

    for (i, a) in locations.iter().enumerate() {
        for b in &locations[i + 1..] {
            pairs.push(DistancePair {
                from: a.into(),
                to: b.into(),
                distance: euclidean(a, b),
                floor,
            });
        }
    }

    for a in locations {
        pairs.push(DistancePair {
            from: a.into(),
            to: a.into(),
            distance: 0.0,
            floor,
        });
    }

    pairs
}

/// Group loaded pairs by their floor, preserving load order.
pub fn group_pairs_by_floor(pairs: impl IntoIterator<Item = DistancePair>) -> DistancesByFloor {
    let mut grouped = DistancesByFloor::new();
    for pair in pairs {
        grouped.entry(pair.floor).or_default().push(pair);
    }
    grouped
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Pair-count breakdown for one floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorAnalysis {
    pub floor: Floor,
    pub locations: usize,
    /// `n(n-1)/2`
    pub undirected_pairs: usize,
    /// `n`
    pub self_pairs: usize,
    /// `n(n+1)/2`
    pub total_pairs: usize,
}

/// Expected pair counts for every floor of a grouped location set.
pub fn analyze(grouped: &BTreeMap<Floor, Vec<Location>>) -> Vec<FloorAnalysis> {
    grouped
        .iter()
        .map(|(floor, locs)| {
            let n = locs.len();
            FloorAnalysis {
                floor: *floor,
                locations: n,
                undirected_pairs: n * n.saturating_sub(1) / 2,
                self_pairs: n,
                total_pairs: expected_pair_count(n),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: i64, ext: &str, x: f64, y: f64, floor: Floor) -> Location {
        Location {
            id,
            name: format!("Loc {ext}"),
            external_id: ext.to_string(),
            x,
            y,
            floor,
        }
    }

    fn abc() -> Vec<Location> {
        vec![
            loc(1, "A", 0.0, 0.0, 1),
            loc(2, "B", 3.0, 4.0, 1),
            loc(3, "C", 3.0, 4.0, 1),
        ]
    }

    fn find<'a>(pairs: &'a [DistancePair], from: &str, to: &str) -> &'a DistancePair {
        pairs
            .iter()
            .find(|p| p.from.external_id == from && p.to.external_id == to)
            .unwrap_or_else(|| panic!("pair {from}->{to} missing"))
    }

    #[test]
    fn three_locations_yield_six_pairs() {
        let pairs = floor_pairs(1, &abc());
        assert_eq!(pairs.len(), 6);
        assert_eq!(find(&pairs, "A", "B").distance, 5.0);
        assert_eq!(find(&pairs, "A", "C").distance, 5.0);
        assert_eq!(find(&pairs, "B", "C").distance, 0.0);
        assert_eq!(pairs.iter().filter(|p| p.is_self_pair()).count(), 3);
        assert!(pairs.iter().all(|p| p.floor == 1));
    }

    #[test]
    fn pair_count_matches_formula_and_self_pairs_are_zero() {
        for n in 0..12usize {
            let locs: Vec<Location> = (0..n)
                .map(|i| loc(i as i64, &format!("L{i}"), i as f64, (i * i) as f64, 2))
                .collect();
            let pairs = floor_pairs(2, &locs);
            assert_eq!(pairs.len(), expected_pair_count(n));
            let self_pairs: Vec<_> = pairs.iter().filter(|p| p.is_self_pair()).collect();
            assert_eq!(self_pairs.len(), n);
            assert!(self_pairs.iter().all(|p| p.distance == 0.0));
        }
    }

    #[test]
    fn only_one_direction_stored_per_unordered_pair() {
        let pairs = floor_pairs(1, &abc());
        for p in pairs.iter().filter(|p| !p.is_self_pair()) {
            let reversed = pairs
                .iter()
                .filter(|q| q.from.external_id == p.to.external_id && q.to.external_id == p.from.external_id)
                .count();
            assert_eq!(reversed, 0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = loc(1, "A", -2.5, 7.0, 1);
        let b = loc(2, "B", 4.0, -1.5, 1);
        assert_eq!(euclidean(&a, &b), euclidean(&b, &a));

        let forward = floor_pairs(1, &[a.clone(), b.clone()]);
        let backward = floor_pairs(1, &[b, a]);
        assert_eq!(forward[0].distance, backward[0].distance);
    }

    #[test]
    fn grouping_discards_blank_ids_and_splits_floors() {
        let grouped = group_by_floor(vec![
            loc(1, "A", 0.0, 0.0, 1),
            loc(2, " ", 0.0, 0.0, 1),
            loc(3, "C", 0.0, 0.0, 2),
            loc(4, "D", 1.0, 1.0, 1),
        ]);
        assert_eq!(grouped.len(), 2);
        let floor1: Vec<_> = grouped[&1].iter().map(|l| l.external_id.as_str()).collect();
        assert_eq!(floor1, ["A", "D"]);
        assert_eq!(grouped[&2].len(), 1);
    }

    #[test]
    fn analysis_reports_expected_counts() {
        let grouped = group_by_floor(abc());
        let report = analyze(&grouped);
        assert_eq!(
            report,
            vec![FloorAnalysis {
                floor: 1,
                locations: 3,
                undirected_pairs: 3,
                self_pairs: 3,
                total_pairs: 6,
            }]
        );
    }

    #[test]
    fn loaded_pairs_regroup_by_floor() {
        let mut pairs = floor_pairs(1, &abc());
        pairs.extend(floor_pairs(3, &[loc(9, "Z", 1.0, 1.0, 3)]));
        let grouped = group_pairs_by_floor(pairs);
        assert_eq!(grouped[&1].len(), 6);
        assert_eq!(grouped[&3].len(), 1);
    }
}
