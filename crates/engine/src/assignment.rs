//! One assignment cycle: create due tasks, rank present people for every
//! pending task and hand the assigned ones to escalation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use sprout_core::error::EngineError;
use sprout_core::presence::{Booking, Occupant};
use sprout_core::ranking::rank_candidates;
use sprout_core::status::TaskStatus;
use sprout_core::types::{Floor, Timestamp};

use crate::directory::resolve_occupants;
use crate::distances::DistanceRepository;
use crate::escalation::EscalationController;
use crate::Ports;

/// Counts from one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentReport {
    /// Tasks created for plants that came due.
    pub created: u64,
    /// Pending tasks considered.
    pub pending: usize,
    pub assigned: usize,
    /// Tasks with nobody nearby.
    pub expired: usize,
    /// Tasks another writer changed first.
    pub skipped: usize,
    /// Tasks whose write failed; retried next cycle.
    pub failed: usize,
    /// Tasks left pending because their floor's presence could not be read.
    pub deferred: usize,
}

pub async fn run_assignment(
    ports: &Ports,
    distances: &DistanceRepository,
    escalation: &Arc<EscalationController>,
    now: Timestamp,
) -> Result<AssignmentReport, EngineError> {
    let mut report = AssignmentReport {
        created: match ports.schedules.create_due_tasks(now).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create due tasks");
                0
            }
        },
        ..AssignmentReport::default()
    };

    let pending = ports.tasks.pending_tasks().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load pending tasks");
        EngineError::from(e)
    })?;
    report.pending = pending.len();
    if pending.is_empty() {
        tracing::debug!(created = report.created, "No pending tasks");
        return Ok(report);
    }

    let floors: BTreeSet<Floor> = pending.iter().map(|t| t.floor).collect();
    let mut bookings: Vec<Booking> = Vec::new();
    let mut unavailable: BTreeSet<Floor> = BTreeSet::new();
    for floor in floors {
        match ports.presence.bookings_for_floor(floor).await {
            Ok(found) => {
                tracing::debug!(floor, bookings = found.len(), "Presence loaded");
                bookings.extend(found);
            }
            Err(e) => {
                tracing::warn!(
                    floor,
                    error = %e,
                    "Presence unavailable, floor left pending until next cycle"
                );
                unavailable.insert(floor);
            }
        }
    }

    let occupants = resolve_occupants(ports.directory.as_ref(), ports.handles.as_deref(), &bookings).await?;
    let mut by_floor: BTreeMap<Floor, Vec<Occupant>> = BTreeMap::new();
    for (booking, occupant) in bookings.iter().zip(occupants) {
        by_floor.entry(booking.floor).or_default().push(occupant);
    }

    let pairs_by_floor = distances.load_all().await;

    for task in &pending {
        if unavailable.contains(&task.floor) {
            report.deferred += 1;
            continue;
        }
        let pairs = pairs_by_floor.get(&task.floor).map(Vec::as_slice).unwrap_or_default();
        if pairs.is_empty() {
            tracing::warn!(task_id = task.task_id, floor = task.floor, "No distance pairs for floor");
        }
        let occupants = by_floor.get(&task.floor).map(Vec::as_slice).unwrap_or_default();
        let candidates = rank_candidates(&task.location_external_id, pairs, occupants);
        if candidates.is_empty() {
            tracing::debug!(error = %EngineError::NoCandidates(task.task_id), "Task will expire");
        }

        match ports.tasks.set_candidates(task.task_id, &candidates, now).await {
            Ok(Some(TaskStatus::Assigned)) => {
                report.assigned += 1;
                tracing::info!(task_id = task.task_id, candidates = candidates.len(), "Task assigned");
                if let Some(&head) = candidates.first() {
                    escalation.notify_assignee(task.task_id, head).await;
                }
            }
            Ok(Some(TaskStatus::Expired)) => {
                report.expired += 1;
                tracing::info!(task_id = task.task_id, "Task expired, nobody nearby");
            }
            Ok(_) => {
                report.skipped += 1;
                tracing::debug!(task_id = task.task_id, "Task no longer pending");
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(task_id = task.task_id, error = %e, "Failed to store candidates");
            }
        }
    }

    tracing::info!(
        created = report.created,
        pending = report.pending,
        assigned = report.assigned,
        expired = report.expired,
        deferred = report.deferred,
        "Assignment cycle finished",
    );
    Ok(report)
}
