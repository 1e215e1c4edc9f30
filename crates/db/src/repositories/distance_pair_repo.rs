//! Repository for the `distance_pairs` table.
//!
//! Pairs are never updated in place: a floor is replaced wholesale.

use sprout_core::distance::DistancePair;
use sqlx::PgPool;

use crate::models::distance_pair::{DistancePairRow, FloorPairCount};

/// Column list for `distance_pairs` queries.
const COLUMNS: &str = "from_id, to_id, from_label, to_label, distance, floor";

/// Provides floor-level replace and paged reads of distance pairs.
pub struct DistancePairRepo;

impl DistancePairRepo {
    /// Delete every pair of `floor` and insert `pairs` in one transaction.
    ///
    /// Returns the number of inserted rows.
    pub async fn replace_floor(
        pool: &PgPool,
        floor: i32,
        pairs: &[DistancePair],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM distance_pairs WHERE floor = $1")
            .bind(floor)
            .execute(&mut *tx)
            .await?;

        let from_ids: Vec<&str> = pairs.iter().map(|p| p.from.external_id.as_str()).collect();
        let to_ids: Vec<&str> = pairs.iter().map(|p| p.to.external_id.as_str()).collect();
        let from_labels: Vec<&str> = pairs.iter().map(|p| p.from.label.as_str()).collect();
        let to_labels: Vec<&str> = pairs.iter().map(|p| p.to.label.as_str()).collect();
        let distances: Vec<f64> = pairs.iter().map(|p| p.distance).collect();

        let inserted = sqlx::query(
            "INSERT INTO distance_pairs (from_id, to_id, from_label, to_label, distance, floor) \
             SELECT f, t, fl, tl, d, $6 \
             FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::float8[]) \
                 AS u(f, t, fl, tl, d)",
        )
        .bind(&from_ids)
        .bind(&to_ids)
        .bind(&from_labels)
        .bind(&to_labels)
        .bind(&distances)
        .bind(floor)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(inserted)
    }

    /// Total number of stored pairs across all floors.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM distance_pairs")
            .fetch_one(pool)
            .await
    }

    /// Fetch one page of pairs in insertion order.
    pub async fn fetch_page(
        pool: &PgPool,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DistancePairRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM distance_pairs ORDER BY id LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, DistancePairRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Stored pair count per floor.
    pub async fn count_by_floor(pool: &PgPool) -> Result<Vec<FloorPairCount>, sqlx::Error> {
        sqlx::query_as::<_, FloorPairCount>(
            "SELECT floor, COUNT(*) AS pairs FROM distance_pairs GROUP BY floor ORDER BY floor",
        )
        .fetch_all(pool)
        .await
    }
}
