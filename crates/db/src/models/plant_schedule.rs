//! Plant schedule rows and the care interval join.

use serde::Serialize;
use sprout_core::types::{DbId, Timestamp};
use sprout_core::watering::CareInterval;
use sqlx::FromRow;

/// A row from the `plant_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlantSchedule {
    pub id: DbId,
    pub plant_id: DbId,
    pub last_watered: Option<Timestamp>,
    pub next_watering: Option<Timestamp>,
}

/// `watering_tasks -> plants -> plant_care` join for finalization.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CareIntervalRow {
    pub plant_id: DbId,
    pub interval_days: i32,
}

impl From<CareIntervalRow> for CareInterval {
    fn from(row: CareIntervalRow) -> Self {
        CareInterval {
            plant_id: row.plant_id,
            interval_days: row.interval_days,
        }
    }
}
