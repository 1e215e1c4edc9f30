//! Watering tasks, their notification summary and recurring schedule math.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::status::TaskStatus;
use crate::types::{DbId, Floor, Timestamp};

/// The persisted state of a watering task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WateringTask {
    pub id: DbId,
    pub plant_id: DbId,
    pub status: TaskStatus,
    /// Remaining candidates, head first. The head is the current assignee
    /// while the task is `assigned`.
    pub candidate_ids: Vec<DbId>,
    pub assigned_employee_id: Option<DbId>,
    pub notified_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// What happens to an `assigned` task when its confirmation window closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutStep {
    /// Hand the task to `next`; `remaining` is the new candidate list with
    /// `next` at its head.
    Advance { next: DbId, remaining: Vec<DbId> },
    /// Nobody is left to ask.
    Expire,
}

impl WateringTask {
    /// Drop the current assignee from the candidate list and decide the
    /// next step.
    pub fn timeout_step(&self) -> TimeoutStep {
        let remaining: Vec<DbId> = self
            .candidate_ids
            .iter()
            .copied()
            .filter(|id| Some(*id) != self.assigned_employee_id)
            .collect();
        match remaining.first() {
            Some(&next) => TimeoutStep::Advance { next, remaining },
            None => TimeoutStep::Expire,
        }
    }

    /// Whether the confirmation window of the current assignee has elapsed.
    pub fn is_overdue(&self, now: Timestamp, timeout: Duration) -> bool {
        self.status == TaskStatus::Assigned
            && self
                .notified_at
                .map(|at| at + timeout <= now)
                .unwrap_or(true)
    }
}

/// A `pending` task joined with everything ranking and notification need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignableTask {
    pub task_id: DbId,
    pub plant_id: DbId,
    /// External id of the plant's location; matched against distance pairs.
    pub location_external_id: String,
    pub floor: Floor,
    pub summary: TaskSummary,
}

/// Everything a notification shows about a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: DbId,
    pub plant_name: Option<String>,
    pub location_name: String,
    /// Water volume in millilitres.
    pub volume_ml: Option<i32>,
    pub method: Option<String>,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Recurring schedule
// ---------------------------------------------------------------------------

/// Care interval for the plant behind a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareInterval {
    pub plant_id: DbId,
    pub interval_days: i32,
}

/// New last-watered / next-watering values for a plant schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAdvance {
    pub last_watered: Timestamp,
    pub next_watering: Timestamp,
}

/// Compute the schedule after a confirmed watering.
///
/// `display_offset` shifts "now" into the display timezone before the
/// interval is added.
pub fn advance_schedule(now: Timestamp, interval_days: i32, display_offset: Duration) -> ScheduleAdvance {
    let last_watered = now + display_offset;
    ScheduleAdvance {
        last_watered,
        next_watering: last_watered + Duration::days(i64::from(interval_days)),
    }
}
