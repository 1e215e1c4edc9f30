//! Distance pair rows.

use serde::Serialize;
use sprout_core::distance::{DistancePair, PairEndpoint};
use sqlx::FromRow;

/// A row from the `distance_pairs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DistancePairRow {
    pub from_id: String,
    pub to_id: String,
    pub from_label: Option<String>,
    pub to_label: Option<String>,
    pub distance: Option<f64>,
    pub floor: i32,
}

impl DistancePairRow {
    /// Convert into a domain pair. Rows whose distance is still `NULL`
    /// are not usable for ranking and yield `None`.
    pub fn into_pair(self) -> Option<DistancePair> {
        let distance = self.distance?;
        Some(DistancePair {
            from: PairEndpoint {
                label: self.from_label.unwrap_or_else(|| self.from_id.clone()),
                external_id: self.from_id,
            },
            to: PairEndpoint {
                label: self.to_label.unwrap_or_else(|| self.to_id.clone()),
                external_id: self.to_id,
            },
            distance,
            floor: self.floor,
        })
    }
}

/// Per-floor stored pair count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FloorPairCount {
    pub floor: i32,
    pub pairs: i64,
}
