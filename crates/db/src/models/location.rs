//! Location rows.

use serde::Serialize;
use sprout_core::location::Location;
use sprout_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `locations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LocationRow {
    pub id: DbId,
    pub name: String,
    pub external_id: String,
    pub x_value: Option<f64>,
    pub y_value: Option<f64>,
    pub floor: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<LocationRow> for Location {
    /// Missing coordinates and floor default to zero.
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
            external_id: row.external_id,
            x: row.x_value.unwrap_or(0.0),
            y: row.y_value.unwrap_or(0.0),
            floor: row.floor.unwrap_or(0),
        }
    }
}
