//! Repository for the `locations` table.

use sprout_core::location::LocationUpsert;
use sqlx::PgPool;

use crate::models::location::LocationRow;

/// Column list for `locations` queries.
const COLUMNS: &str = "id, name, external_id, x_value, y_value, floor, created_at, updated_at";

/// Provides read and sync operations for locations.
pub struct LocationRepo;

impl LocationRepo {
    /// List every location ordered by id.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<LocationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locations ORDER BY id");
        sqlx::query_as::<_, LocationRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a location by its booking-service identifier.
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<LocationRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locations WHERE external_id = $1");
        sqlx::query_as::<_, LocationRow>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new location or update an existing one when its name,
    /// coordinate or floor changed.
    ///
    /// Returns `true` if a row was inserted or updated.
    pub async fn upsert(pool: &PgPool, input: &LocationUpsert) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO locations (name, external_id, x_value, y_value, floor) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (external_id) DO UPDATE \
             SET name = EXCLUDED.name, x_value = EXCLUDED.x_value, \
                 y_value = EXCLUDED.y_value, floor = EXCLUDED.floor \
             WHERE locations.name IS DISTINCT FROM EXCLUDED.name \
                OR locations.x_value IS DISTINCT FROM EXCLUDED.x_value \
                OR locations.y_value IS DISTINCT FROM EXCLUDED.y_value \
                OR locations.floor IS DISTINCT FROM EXCLUDED.floor",
        )
        .bind(&input.name)
        .bind(&input.external_id)
        .bind(input.x)
        .bind(input.y)
        .bind(input.floor)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
