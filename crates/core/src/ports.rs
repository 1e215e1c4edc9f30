//! Traits describing every external collaborator of the engine.
//!
//! The engine only talks to storage, the booking service, the directory
//! and the chat service through these seams. Production implementations
//! live in `sprout-db`, `sprout-booking` and `sprout-notify`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::distance::DistancePair;
use crate::location::{Location, LocationUpsert};
use crate::presence::{Booking, Person, PresentPerson};
use crate::status::TaskStatus;
use crate::types::{DbId, Floor, Timestamp};
use crate::watering::{AssignableTask, CareInterval, ScheduleAdvance, TaskSummary, WateringTask};

/// Error crossing a port boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    /// An upstream source could not be read.
    #[error("source unavailable: {0}")]
    Source(String),

    /// A store read or write failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// A notification could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

pub type PortResult<T> = Result<T, PortError>;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Read-only listing of locations.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn list_locations(&self) -> PortResult<Vec<Location>>;
}

/// Who is booked where today.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    async fn bookings_for_floor(&self, floor: Floor) -> PortResult<Vec<Booking>>;
}

/// Floor resources as known to the booking service.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Floors this source knows how to query.
    fn floors(&self) -> Vec<Floor>;

    async fn resources_for_floor(&self, floor: Floor) -> PortResult<Vec<LocationUpsert>>;
}

/// Writable location store used by resource sync.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Insert or update one location. Returns `true` when a row changed.
    async fn upsert_location(&self, location: &LocationUpsert) -> PortResult<bool>;
}

/// Maps people discovered in bookings to directory entries.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Make sure every person has a directory entry. Returns how many
    /// entries were created.
    async fn register(&self, people: &[PresentPerson]) -> PortResult<u64>;

    /// Resolve lower-cased emails to directory entries.
    async fn resolve_by_email(&self, emails: &[String]) -> PortResult<Vec<Person>>;

    async fn find_person(&self, id: DbId) -> PortResult<Option<Person>>;

    async fn set_messaging_handle(&self, id: DbId, handle: &str) -> PortResult<()>;
}

/// Chat-side lookup of a messaging handle by email.
#[async_trait]
pub trait HandleLookup: Send + Sync {
    async fn lookup_handle(&self, email: &str) -> PortResult<Option<String>>;
}

// ---------------------------------------------------------------------------
// Notification channel
// ---------------------------------------------------------------------------

/// Identifies a delivered message so it can be updated later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryHandle {
    pub channel: String,
    pub message_ref: String,
}

/// Final state shown on a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    /// The confirmation window closed without a reply.
    TimedOut,
    /// The assignee confirmed in time.
    Confirmed,
    /// A confirmation arrived after the task had moved on.
    TooLate,
    /// Someone else already finished the task.
    AlreadyDone,
    /// The confirmed task does not exist.
    NotFound,
}

/// Sends task notifications and rewrites them once an outcome is known.
///
/// Confirmations travel the other way: the transport's ingress hands them
/// to the escalation controller.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, handle: &str, summary: &TaskSummary) -> PortResult<DeliveryHandle>;

    async fn close(&self, delivery: &DeliveryHandle, outcome: DeliveryOutcome) -> PortResult<()>;
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Persisted distance pairs.
#[async_trait]
pub trait DistanceStore: Send + Sync {
    /// Delete every pair of `floor`, then insert `pairs`. Returns the
    /// number inserted.
    async fn replace_floor(&self, floor: Floor, pairs: &[DistancePair]) -> PortResult<u64>;

    async fn count_pairs(&self) -> PortResult<i64>;

    /// Stored pairs per floor.
    async fn count_by_floor(&self) -> PortResult<BTreeMap<Floor, i64>>;

    /// Fetch one page in a stable order.
    async fn fetch_page(&self, offset: i64, limit: i64) -> PortResult<Vec<DistancePair>>;
}

/// Task persistence. Every mutation is a conditional update that returns
/// `false` when the row was not in the expected state.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn pending_tasks(&self) -> PortResult<Vec<AssignableTask>>;

    async fn find_task(&self, task_id: DbId) -> PortResult<Option<WateringTask>>;

    async fn task_summary(&self, task_id: DbId) -> PortResult<Option<TaskSummary>>;

    /// Store the ranked list. A non-empty list makes the task `assigned`
    /// to its head, an empty one `expired`. Only applies to `pending`
    /// tasks; returns the resulting status or `None` when skipped.
    async fn set_candidates(
        &self,
        task_id: DbId,
        candidate_ids: &[DbId],
        now: Timestamp,
    ) -> PortResult<Option<TaskStatus>>;

    /// Move an `assigned` task from `expected_assignee` to the head of
    /// `remaining` and refresh `notified_at`.
    async fn advance_to_next(
        &self,
        task_id: DbId,
        expected_assignee: Option<DbId>,
        remaining: &[DbId],
        now: Timestamp,
    ) -> PortResult<bool>;

    /// `assigned` -> `expired`, clearing assignee and candidates.
    async fn mark_expired(&self, task_id: DbId, expected_assignee: Option<DbId>) -> PortResult<bool>;

    /// `assigned` -> `done`, clearing assignee and candidates.
    async fn mark_done(&self, task_id: DbId) -> PortResult<bool>;

    /// `assigned` tasks notified at or before `cutoff`.
    async fn overdue_assigned(&self, cutoff: Timestamp) -> PortResult<Vec<WateringTask>>;

    /// `assigned` -> `pending`, clearing assignee and candidates.
    async fn reset(&self, task_id: DbId) -> PortResult<bool>;
}

/// Recurring watering schedule per plant.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Create a `pending` task for every plant whose next watering is
    /// before `now` and which has no open task. Returns the number created.
    async fn create_due_tasks(&self, now: Timestamp) -> PortResult<u64>;

    async fn care_interval(&self, task_id: DbId) -> PortResult<Option<CareInterval>>;

    async fn advance_schedule(&self, plant_id: DbId, advance: &ScheduleAdvance) -> PortResult<()>;
}
