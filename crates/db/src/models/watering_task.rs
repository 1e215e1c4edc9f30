//! Watering task rows.

use serde::Serialize;
use sprout_core::status::{StatusId, TaskStatus};
use sprout_core::types::{DbId, Timestamp};
use sprout_core::watering::{AssignableTask, TaskSummary, WateringTask};
use sqlx::FromRow;

/// A row from the `watering_tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WateringTaskRow {
    pub id: DbId,
    pub plant_id: DbId,
    pub status_id: StatusId,
    pub candidate_ids: Vec<DbId>,
    pub assigned_employee_id: Option<DbId>,
    pub notified_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WateringTaskRow {
    pub fn into_task(self) -> Result<WateringTask, sqlx::Error> {
        let status = TaskStatus::from_id(self.status_id).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown task status id {}", self.status_id).into())
        })?;
        Ok(WateringTask {
            id: self.id,
            plant_id: self.plant_id,
            status,
            candidate_ids: self.candidate_ids,
            assigned_employee_id: self.assigned_employee_id,
            notified_at: self.notified_at,
            created_at: self.created_at,
        })
    }
}

/// A task joined with its plant, care instructions and location.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskDetailRow {
    pub task_id: DbId,
    pub plant_id: DbId,
    pub plant_name: Option<String>,
    pub image_url: Option<String>,
    pub volume_ml: Option<i32>,
    pub method: Option<String>,
    pub location_name: String,
    pub location_external_id: String,
    pub floor: Option<i32>,
}

impl TaskDetailRow {
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            task_id: self.task_id,
            plant_name: self.plant_name.clone(),
            location_name: self.location_name.clone(),
            volume_ml: self.volume_ml,
            method: self.method.clone(),
            image_url: self.image_url.clone(),
        }
    }

    pub fn into_assignable(self) -> AssignableTask {
        AssignableTask {
            summary: self.summary(),
            task_id: self.task_id,
            plant_id: self.plant_id,
            location_external_id: self.location_external_id,
            floor: self.floor.unwrap_or(0),
        }
    }
}
