//! Repository for the `watering_tasks` table.
//!
//! Every status change is a conditional `UPDATE` guarded by the status
//! (and, where it matters, the assignee) the caller expects. A return
//! value of `false` means another writer got there first.

use sprout_core::status::TaskStatus;
use sprout_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::watering_task::{TaskDetailRow, WateringTaskRow};

/// Column list for `watering_tasks` queries.
const COLUMNS: &str = "id, plant_id, status_id, candidate_ids, assigned_employee_id, \
    notified_at, created_at, updated_at";

/// Task joined with plant, care and location.
const DETAIL_SELECT: &str = "SELECT t.id AS task_id, t.plant_id, p.name AS plant_name, \
    p.image_url, c.volume_ml, c.method, l.name AS location_name, \
    l.external_id AS location_external_id, l.floor \
    FROM watering_tasks t \
    JOIN plants p ON p.id = t.plant_id \
    JOIN plant_care c ON c.id = p.care_id \
    JOIN locations l ON l.id = p.location_id";

/// Provides task reads and guarded status transitions.
pub struct WateringTaskRepo;

impl WateringTaskRepo {
    /// Find a task by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WateringTaskRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM watering_tasks WHERE id = $1");
        sqlx::query_as::<_, WateringTaskRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All `pending` tasks with their plant and location details, oldest first.
    pub async fn list_pending_details(pool: &PgPool) -> Result<Vec<TaskDetailRow>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE t.status_id = $1 ORDER BY t.id");
        sqlx::query_as::<_, TaskDetailRow>(&query)
            .bind(TaskStatus::Pending.id())
            .fetch_all(pool)
            .await
    }

    /// Plant and location details for one task, whatever its status.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<TaskDetailRow>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE t.id = $1");
        sqlx::query_as::<_, TaskDetailRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Store the ranked candidate list of a `pending` task.
    ///
    /// A non-empty list assigns the task to its head and stamps
    /// `notified_at`; an empty list expires it. Returns the new status, or
    /// `None` when the task was not pending.
    pub async fn set_candidates(
        pool: &PgPool,
        id: DbId,
        candidate_ids: &[DbId],
        now: Timestamp,
    ) -> Result<Option<TaskStatus>, sqlx::Error> {
        let (status, head, notified_at) = match candidate_ids.first() {
            Some(&head) => (TaskStatus::Assigned, Some(head), Some(now)),
            None => (TaskStatus::Expired, None, None),
        };

        let updated = sqlx::query_scalar::<_, DbId>(
            "UPDATE watering_tasks \
             SET status_id = $2, candidate_ids = $3, assigned_employee_id = $4, notified_at = $5 \
             WHERE id = $1 AND status_id = $6 \
             RETURNING id",
        )
        .bind(id)
        .bind(status.id())
        .bind(candidate_ids)
        .bind(head)
        .bind(notified_at)
        .bind(TaskStatus::Pending.id())
        .fetch_optional(pool)
        .await?;

        Ok(updated.map(|_| status))
    }

    /// Hand an `assigned` task from `expected_assignee` to the head of
    /// `remaining`.
    pub async fn advance_to_next(
        pool: &PgPool,
        id: DbId,
        expected_assignee: Option<DbId>,
        remaining: &[DbId],
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE watering_tasks \
             SET candidate_ids = $3, assigned_employee_id = $4, notified_at = $5 \
             WHERE id = $1 AND status_id = $6 \
               AND assigned_employee_id IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(expected_assignee)
        .bind(remaining)
        .bind(remaining.first().copied())
        .bind(now)
        .bind(TaskStatus::Assigned.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `assigned` -> `expired` while still held by `expected_assignee`.
    pub async fn mark_expired(
        pool: &PgPool,
        id: DbId,
        expected_assignee: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE watering_tasks \
             SET status_id = $3, candidate_ids = '{}', assigned_employee_id = NULL \
             WHERE id = $1 AND status_id = $4 \
               AND assigned_employee_id IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(expected_assignee)
        .bind(TaskStatus::Expired.id())
        .bind(TaskStatus::Assigned.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `assigned` -> `done`.
    pub async fn mark_done(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE watering_tasks \
             SET status_id = $2, candidate_ids = '{}', assigned_employee_id = NULL \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(TaskStatus::Done.id())
        .bind(TaskStatus::Assigned.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `assigned` -> `pending`, forgetting the assignment.
    pub async fn reset(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE watering_tasks \
             SET status_id = $2, candidate_ids = '{}', assigned_employee_id = NULL, \
                 notified_at = NULL \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(TaskStatus::Pending.id())
        .bind(TaskStatus::Assigned.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `assigned` tasks whose notification went out at or before `cutoff`
    /// (or never went out).
    pub async fn list_overdue_assigned(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<WateringTaskRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM watering_tasks \
             WHERE status_id = $1 AND (notified_at IS NULL OR notified_at <= $2) \
             ORDER BY id"
        );
        sqlx::query_as::<_, WateringTaskRow>(&query)
            .bind(TaskStatus::Assigned.id())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
