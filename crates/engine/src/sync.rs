//! Location sync from the booking service's floor resources.

use serde::Serialize;
use sprout_core::ports::{LocationStore, ResourceSource};
use sprout_core::types::Floor;

use crate::distances::FloorBuild;

/// Result of syncing one floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorSync {
    pub floor: Floor,
    pub resources: usize,
    pub changed: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub floors: Vec<FloorSync>,
    /// Distance rebuild triggered by the sync, if anything changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rebuild: Option<Vec<FloorBuild>>,
}

impl SyncReport {
    /// Locations inserted or updated across all floors.
    pub fn changed(&self) -> usize {
        self.floors.iter().map(|f| f.changed).sum()
    }
}

/// Upsert every configured floor's resources into the location store.
///
/// A floor that cannot be fetched, or whose write fails, is recorded and
/// skipped. Rows written before a failure stay written.
pub async fn sync_locations(resources: &dyn ResourceSource, store: &dyn LocationStore) -> SyncReport {
    let mut report = SyncReport::default();

    for floor in resources.floors() {
        let mut entry = FloorSync {
            floor,
            resources: 0,
            changed: 0,
            error: None,
        };

        match resources.resources_for_floor(floor).await {
            Ok(upserts) => {
                entry.resources = upserts.len();
                for upsert in &upserts {
                    match store.upsert_location(upsert).await {
                        Ok(true) => entry.changed += 1,
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!(floor, external_id = %upsert.external_id, error = %e, "Location upsert failed");
                            entry.error = Some(e.to_string());
                            break;
                        }
                    }
                }
                tracing::info!(floor, resources = entry.resources, changed = entry.changed, "Floor locations synced");
            }
            Err(e) => {
                tracing::warn!(floor, error = %e, "Failed to fetch floor resources");
                entry.error = Some(e.to_string());
            }
        }
        report.floors.push(entry);
    }

    report
}
