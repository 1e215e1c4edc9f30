//! Building, storing and loading the per-floor distance matrix.

use std::sync::Arc;

use serde::Serialize;
use sprout_core::distance::{analyze, floor_pairs, group_by_floor, group_pairs_by_floor, DistancesByFloor};
use sprout_core::error::EngineError;
use sprout_core::ports::{DistanceStore, LocationSource};
use sprout_core::types::Floor;

/// Result of rebuilding one floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorBuild {
    pub floor: Floor,
    pub locations: usize,
    pub pairs: usize,
    /// Rows written, or `None` when the replace failed.
    pub stored: Option<u64>,
    pub error: Option<String>,
}

/// Recompute every floor's pairs and replace them in the store.
///
/// A location fetch failure aborts the run. A failed replace is recorded
/// for that floor and the remaining floors are still processed.
pub async fn build_distances(
    locations: &dyn LocationSource,
    store: &dyn DistanceStore,
) -> Result<Vec<FloorBuild>, EngineError> {
    let all = locations.list_locations().await.map_err(|e| {
        tracing::error!(error = %e, "Distance build aborted: cannot list locations");
        EngineError::SourceUnavailable(e.to_string())
    })?;

    let total = all.len();
    let grouped = group_by_floor(all);
    let mut report = Vec::with_capacity(grouped.len());

    for (floor, locs) in &grouped {
        let pairs = floor_pairs(*floor, locs);
        let outcome = store.replace_floor(*floor, &pairs).await;
        let (stored, error) = match outcome {
            Ok(n) => {
                tracing::info!(floor, locations = locs.len(), pairs = n, "Floor distances replaced");
                (Some(n), None)
            }
            Err(e) => {
                tracing::error!(floor, error = %e, "Failed to replace floor distances");
                (None, Some(e.to_string()))
            }
        };
        report.push(FloorBuild {
            floor: *floor,
            locations: locs.len(),
            pairs: pairs.len(),
            stored,
            error,
        });
    }

    tracing::info!(locations = total, floors = report.len(), "Distance build finished");
    Ok(report)
}

/// Paged reader over the distance store.
pub struct DistanceRepository {
    store: Arc<dyn DistanceStore>,
    page_size: i64,
}

impl DistanceRepository {
    pub fn new(store: Arc<dyn DistanceStore>, page_size: i64) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    /// Load every pair, grouped by floor.
    ///
    /// Pages are driven by a prior count. Any failure stops loading and
    /// returns what was accumulated so far, possibly nothing.
    pub async fn load_all(&self) -> DistancesByFloor {
        let total = match self.store.count_pairs().await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Failed to count distance pairs");
                return DistancesByFloor::new();
            }
        };

        let mut pairs = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        let mut offset = 0i64;
        while offset < total {
            match self.store.fetch_page(offset, self.page_size).await {
                Ok(page) => pairs.extend(page),
                Err(e) => {
                    tracing::error!(offset, error = %e, "Failed to fetch distance page");
                    break;
                }
            }
            offset += self.page_size;
        }

        tracing::debug!(total, loaded = pairs.len(), "Distance pairs loaded");
        group_pairs_by_floor(pairs)
    }
}

/// Expected versus stored pair counts for one floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorSummary {
    pub floor: Floor,
    pub locations: usize,
    pub undirected_pairs: usize,
    pub self_pairs: usize,
    pub expected_pairs: usize,
    pub stored_pairs: i64,
}

impl FloorSummary {
    pub fn is_complete(&self) -> bool {
        self.stored_pairs == self.expected_pairs as i64
    }
}

/// Compare the current locations against what is stored.
pub async fn summarize(
    locations: &dyn LocationSource,
    store: &dyn DistanceStore,
) -> Result<Vec<FloorSummary>, EngineError> {
    let grouped = group_by_floor(locations.list_locations().await?);
    let mut stored = store.count_by_floor().await?;

    let mut summary: Vec<FloorSummary> = analyze(&grouped)
        .into_iter()
        .map(|a| FloorSummary {
            floor: a.floor,
            locations: a.locations,
            undirected_pairs: a.undirected_pairs,
            self_pairs: a.self_pairs,
            expected_pairs: a.total_pairs,
            stored_pairs: stored.remove(&a.floor).unwrap_or(0),
        })
        .collect();

    // Floors with stored pairs but no locations left.
    summary.extend(stored.into_iter().map(|(floor, n)| FloorSummary {
        floor,
        locations: 0,
        undirected_pairs: 0,
        self_pairs: 0,
        expected_pairs: 0,
        stored_pairs: n,
    }));
    summary.sort_by_key(|s| s.floor);
    Ok(summary)
}
