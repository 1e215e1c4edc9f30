//! Repository for `plant_schedules` and the due-task query.

use sprout_core::status::TaskStatus;
use sprout_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::plant_schedule::{CareIntervalRow, PlantSchedule};

/// Column list for `plant_schedules` queries.
const COLUMNS: &str = "id, plant_id, last_watered, next_watering";

/// Provides the recurring watering schedule.
pub struct PlantScheduleRepo;

impl PlantScheduleRepo {
    /// Find the schedule of a plant.
    pub async fn find_by_plant(
        pool: &PgPool,
        plant_id: DbId,
    ) -> Result<Option<PlantSchedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM plant_schedules WHERE plant_id = $1");
        sqlx::query_as::<_, PlantSchedule>(&query)
            .bind(plant_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a `pending` task for every plant due before `now` that has
    /// no open task. Returns the number of tasks created.
    pub async fn create_due_tasks(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO watering_tasks (plant_id, status_id, created_at) \
             SELECT s.plant_id, $2, $1 FROM plant_schedules s \
             WHERE s.next_watering < $1 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM watering_tasks t \
                   WHERE t.plant_id = s.plant_id AND t.status_id IN ($2, $3)) \
             ORDER BY s.next_watering \
             ON CONFLICT DO NOTHING",
        )
        .bind(now)
        .bind(TaskStatus::Pending.id())
        .bind(TaskStatus::Assigned.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Care interval of the plant behind a task.
    pub async fn care_interval_for_task(
        pool: &PgPool,
        task_id: DbId,
    ) -> Result<Option<CareIntervalRow>, sqlx::Error> {
        sqlx::query_as::<_, CareIntervalRow>(
            "SELECT p.id AS plant_id, c.interval_days \
             FROM watering_tasks t \
             JOIN plants p ON p.id = t.plant_id \
             JOIN plant_care c ON c.id = p.care_id \
             WHERE t.id = $1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// Record a watering and the next due time.
    pub async fn advance(
        pool: &PgPool,
        plant_id: DbId,
        last_watered: Timestamp,
        next_watering: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO plant_schedules (plant_id, last_watered, next_watering) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (plant_id) DO UPDATE \
             SET last_watered = EXCLUDED.last_watered, next_watering = EXCLUDED.next_watering",
        )
        .bind(plant_id)
        .bind(last_watered)
        .bind(next_watering)
        .execute(pool)
        .await?;
        Ok(())
    }
}
