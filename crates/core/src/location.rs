//! Fixed locations on a floor (desks, shelves, plant spots).

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Floor};

/// A location with a 2-D coordinate on a single floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: DbId,
    pub name: String,
    /// Resource identifier in the booking service. Bookings reference
    /// locations by this value.
    pub external_id: String,
    pub x: f64,
    pub y: f64,
    pub floor: Floor,
}

impl Location {
    /// Locations without an external identifier can never be matched
    /// against a booking, so they are not worth ranking.
    pub fn is_rankable(&self) -> bool {
        !self.external_id.trim().is_empty()
    }
}

/// A resource as reported by the booking service, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpsert {
    pub external_id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub floor: Floor,
}

/// Reduce a resource polygon to a single point by averaging its vertices.
///
/// Returns `None` for an empty polygon.
pub fn centroid(vertices: &[(f64, f64)]) -> Option<(f64, f64)> {
    if vertices.is_empty() {
        return None;
    }
    let n = vertices.len() as f64;
    let (sx, sy) = vertices
        .iter()
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    Some((sx / n, sy / n))
}
