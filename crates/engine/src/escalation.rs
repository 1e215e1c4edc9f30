//! Escalation of assigned tasks: notification, confirmation timeout and
//! confirmation handling.
//!
//! Every transition of a task runs under that task's lock (see
//! [`TaskLocks`]) and re-reads the stored task before acting. The store's
//! conditional updates are the second line: a write that finds the task in
//! another state reports `false` and the transition is dropped as stale.
//!
//! Timers are in-process Tokio tasks, one per notification. A timer never
//! gets cancelled when its task finishes; it fires, re-reads the task and
//! does nothing. Each timer carries the generation it was armed with and
//! only acts while that is still the task's latest notification, so a
//! window always runs the full timeout from the last notification.
//! [`EscalationController::sweep_overdue`] fires the same transition for
//! tasks whose timer was lost to a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sprout_core::error::EngineError;
use sprout_core::ports::{
    DeliveryHandle, DeliveryOutcome, DirectorySource, NotificationChannel, ScheduleStore, TaskStore,
};
use sprout_core::status::state_machine::validate_transition;
use sprout_core::status::TaskStatus;
use sprout_core::types::{DbId, Timestamp};
use sprout_core::watering::{advance_schedule, TimeoutStep, WateringTask};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::locks::TaskLocks;

/// What a fired timeout did to its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TimeoutResult {
    /// The task moved on to `next`.
    Advanced { next: DbId },
    /// No candidate was left.
    Expired,
}

/// Outcome of a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ConfirmResult {
    /// The task is done. `next_watering` is `None` when the schedule
    /// could not be advanced.
    Confirmed { next_watering: Option<Timestamp> },
    /// The task had already moved on.
    TooLate,
    NotFound,
}

/// A confirmation, either clicked in chat or issued by an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub task_id: DbId,
    /// The message the button was clicked on.
    pub delivery: Option<DeliveryHandle>,
    /// Messaging handle of whoever clicked.
    pub confirmed_by: Option<String>,
}

impl ConfirmRequest {
    /// An operator confirmation with no chat context.
    pub fn operator(task_id: DbId) -> Self {
        Self {
            task_id,
            ..Self::default()
        }
    }
}

pub struct EscalationController {
    tasks: Arc<dyn TaskStore>,
    schedules: Arc<dyn ScheduleStore>,
    directory: Arc<dyn DirectorySource>,
    notifications: Arc<dyn NotificationChannel>,
    timeout: Duration,
    window: chrono::Duration,
    display_offset: chrono::Duration,
    locks: TaskLocks,
    /// Latest delivered message per task, so it can be closed later.
    open: Mutex<HashMap<DbId, DeliveryHandle>>,
    /// Generation of the latest armed timer per task.
    armed: Mutex<HashMap<DbId, u64>>,
    generation: AtomicU64,
    cancel: CancellationToken,
}

impl EscalationController {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        schedules: Arc<dyn ScheduleStore>,
        directory: Arc<dyn DirectorySource>,
        notifications: Arc<dyn NotificationChannel>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            tasks,
            schedules,
            directory,
            notifications,
            timeout: config.escalation_timeout,
            window: config.escalation_window(),
            display_offset: config.display_offset,
            locks: TaskLocks::default(),
            open: Mutex::new(HashMap::new()),
            armed: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop every armed timer. Tasks stay `assigned` and are picked up by
    /// the sweep after a restart.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Number of tasks with a delivered, not yet closed message.
    pub fn open_deliveries(&self) -> usize {
        self.open_map().len()
    }

    // -----------------------------------------------------------------------
    // Notification
    // -----------------------------------------------------------------------

    /// Notify the freshly assigned head candidate and arm its timeout.
    pub async fn notify_assignee(self: &Arc<Self>, task_id: DbId, assignee: DbId) {
        let _guard = self.locks.lock(task_id).await;
        self.notify_locked(task_id, assignee).await;
    }

    /// Must be called with the task's lock held.
    async fn notify_locked(self: &Arc<Self>, task_id: DbId, assignee: DbId) {
        // Armed first: an unreachable assignee still times out.
        self.arm_timer(task_id, assignee);

        let summary = match self.tasks.task_summary(task_id).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                tracing::warn!(task_id, "Task vanished before notification");
                return;
            }
            Err(e) => {
                tracing::error!(task_id, error = %e, "Failed to load task summary");
                return;
            }
        };

        let handle = match self.directory.find_person(assignee).await {
            Ok(person) => person.and_then(|p| p.messaging_handle),
            Err(e) => {
                tracing::error!(task_id, person_id = assignee, error = %e, "Failed to load assignee");
                return;
            }
        };
        let Some(handle) = handle else {
            tracing::warn!(task_id, person_id = assignee, "Assignee has no messaging handle, not notified");
            return;
        };

        match self.notifications.send(&handle, &summary).await {
            Ok(delivery) => {
                tracing::info!(task_id, person_id = assignee, "Assignee notified");
                self.open_map().insert(task_id, delivery);
            }
            Err(e) => {
                tracing::warn!(task_id, person_id = assignee, error = %e, "Notification failed");
            }
        }
    }

    /// Must be called with the task's lock held. Supersedes any timer
    /// armed earlier for the task.
    fn arm_timer(self: &Arc<Self>, task_id: DbId, assignee: DbId) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        self.armed_map().insert(task_id, generation);

        let this = Arc::clone(self);
        let cancel = self.cancel.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    match this.fire_timer(task_id, generation, assignee).await {
                        Ok(result) => tracing::info!(task_id, ?result, "Confirmation timed out"),
                        Err(e) if e.is_benign() => tracing::debug!(task_id, error = %e, "Timeout ignored"),
                        Err(e) => tracing::error!(task_id, error = %e, "Timeout transition failed"),
                    }
                }
            }
        });
    }

    // -----------------------------------------------------------------------
    // Timeout
    // -----------------------------------------------------------------------

    /// A timer armed with `generation` ran out.
    async fn fire_timer(
        self: &Arc<Self>,
        task_id: DbId,
        generation: u64,
        assignee: DbId,
    ) -> Result<TimeoutResult, EngineError> {
        let _guard = self.locks.lock(task_id).await;
        if self.armed_map().get(&task_id) != Some(&generation) {
            return Err(stale(task_id, "superseded by a later notification"));
        }
        self.timeout_locked(task_id, Some(assignee), Utc::now()).await
    }

    /// Fire the confirmation timeout of `expected_assignee`.
    ///
    /// Returns [`EngineError::StaleTransition`] when the task is no longer
    /// assigned to that person.
    pub async fn handle_timeout(
        self: &Arc<Self>,
        task_id: DbId,
        expected_assignee: Option<DbId>,
        now: Timestamp,
    ) -> Result<TimeoutResult, EngineError> {
        let _guard = self.locks.lock(task_id).await;
        self.timeout_locked(task_id, expected_assignee, now).await
    }

    /// Must be called with the task's lock held.
    async fn timeout_locked(
        self: &Arc<Self>,
        task_id: DbId,
        expected_assignee: Option<DbId>,
        now: Timestamp,
    ) -> Result<TimeoutResult, EngineError> {
        let Some(task) = self.tasks.find_task(task_id).await? else {
            self.disarm(task_id);
            return Err(stale(task_id, "task not found"));
        };
        if task.status == TaskStatus::Done {
            self.disarm(task_id);
            self.close(self.take_open(task_id).as_ref(), DeliveryOutcome::AlreadyDone)
                .await;
            return Err(stale(task_id, "already done"));
        }
        if task.status != TaskStatus::Assigned {
            return Err(stale(task_id, format!("status is {}", task.status)));
        }
        if task.assigned_employee_id != expected_assignee {
            return Err(stale(task_id, "assignee changed"));
        }

        match task.timeout_step() {
            TimeoutStep::Advance { next, remaining } => {
                if !self
                    .tasks
                    .advance_to_next(task_id, expected_assignee, &remaining, now)
                    .await?
                {
                    return Err(stale(task_id, "advance not applied"));
                }
                self.close(self.take_open(task_id).as_ref(), DeliveryOutcome::TimedOut)
                    .await;
                tracing::info!(task_id, from = ?expected_assignee, to = next, "Task escalated");
                self.notify_locked(task_id, next).await;
                Ok(TimeoutResult::Advanced { next })
            }
            TimeoutStep::Expire => {
                if !self.tasks.mark_expired(task_id, expected_assignee).await? {
                    return Err(stale(task_id, "expire not applied"));
                }
                self.disarm(task_id);
                self.close(self.take_open(task_id).as_ref(), DeliveryOutcome::TimedOut)
                    .await;
                tracing::info!(task_id, "Task expired, no candidates left");
                Ok(TimeoutResult::Expired)
            }
        }
    }

    /// Fire the timeout of every task whose window has closed. Returns
    /// how many tasks moved.
    pub async fn sweep_overdue(self: &Arc<Self>, now: Timestamp) -> usize {
        let overdue = match self.tasks.overdue_assigned(now - self.window).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list overdue tasks");
                return 0;
            }
        };

        let mut moved = 0;
        for task in overdue {
            match self.handle_timeout(task.id, task.assigned_employee_id, now).await {
                Ok(_) => moved += 1,
                Err(e) if e.is_benign() => tracing::debug!(task_id = task.id, error = %e, "Sweep skipped task"),
                Err(e) => tracing::error!(task_id = task.id, error = %e, "Sweep failed for task"),
            }
        }
        if moved > 0 {
            tracing::info!(moved, "Overdue tasks swept");
        }
        moved
    }

    // -----------------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------------

    /// Finish a task on behalf of its current assignee.
    ///
    /// The confirmation only counts when the task is still `assigned`, the
    /// clicked message is the one currently open and the clicker is the
    /// current assignee. A care interval that cannot be read leaves the
    /// task `assigned` and returns the error.
    pub async fn confirm(&self, request: ConfirmRequest, now: Timestamp) -> Result<ConfirmResult, EngineError> {
        let task_id = request.task_id;
        let _guard = self.locks.lock(task_id).await;

        let Some(task) = self.tasks.find_task(task_id).await? else {
            tracing::warn!(task_id, "Confirmation for unknown task");
            self.close(request.delivery.as_ref(), DeliveryOutcome::NotFound)
                .await;
            return Ok(ConfirmResult::NotFound);
        };

        if let Some(reason) = self.rejection(&task, &request).await? {
            tracing::info!(task_id, reason, "Confirmation rejected as too late");
            self.close(request.delivery.as_ref(), DeliveryOutcome::TooLate)
                .await;
            return Ok(ConfirmResult::TooLate);
        }

        let interval = match self.schedules.care_interval(task_id).await {
            Ok(Some(interval)) => interval,
            Ok(None) => {
                tracing::error!(task_id, "No care interval, task left assigned");
                return Err(EngineError::Persistence(format!(
                    "no care interval for task {task_id}"
                )));
            }
            Err(e) => {
                tracing::error!(task_id, error = %e, "Failed to load care interval, task left assigned");
                return Err(e.into());
            }
        };

        if !self.tasks.mark_done(task_id).await? {
            self.close(request.delivery.as_ref(), DeliveryOutcome::TooLate)
                .await;
            return Ok(ConfirmResult::TooLate);
        }

        self.disarm(task_id);
        let tracked = self.take_open(task_id);
        match &request.delivery {
            Some(clicked) => self.close(Some(clicked), DeliveryOutcome::Confirmed).await,
            None => self.close(tracked.as_ref(), DeliveryOutcome::AlreadyDone).await,
        }

        let advance = advance_schedule(now, interval.interval_days, self.display_offset);
        let next_watering = match self.schedules.advance_schedule(interval.plant_id, &advance).await {
            Ok(()) => Some(advance.next_watering),
            Err(e) => {
                tracing::error!(task_id, plant_id = interval.plant_id, error = %e, "Failed to advance schedule");
                None
            }
        };

        tracing::info!(task_id, plant_id = interval.plant_id, "Watering confirmed");
        Ok(ConfirmResult::Confirmed { next_watering })
    }

    /// Why a confirmation does not count, if it does not.
    async fn rejection(
        &self,
        task: &WateringTask,
        request: &ConfirmRequest,
    ) -> Result<Option<&'static str>, EngineError> {
        if validate_transition(task.status, TaskStatus::Done).is_err() {
            return Ok(Some("task is not assigned"));
        }

        let open = self.open_map().get(&task.id).cloned();
        if let (Some(clicked), Some(open)) = (&request.delivery, &open) {
            if clicked != open {
                return Ok(Some("message is not the current one"));
            }
        }

        if let Some(by) = &request.confirmed_by {
            let handle = match task.assigned_employee_id {
                Some(id) => self
                    .directory
                    .find_person(id)
                    .await?
                    .and_then(|p| p.messaging_handle),
                None => None,
            };
            if handle.as_deref() != Some(by.as_str()) {
                return Ok(Some("confirmed by someone else"));
            }
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Return an `assigned` task to `pending` so the next assignment cycle
    /// ranks it again.
    pub async fn reset(&self, task_id: DbId) -> Result<(), EngineError> {
        let _guard = self.locks.lock(task_id).await;

        let Some(task) = self.tasks.find_task(task_id).await? else {
            return Err(stale(task_id, "task not found"));
        };
        validate_transition(task.status, TaskStatus::Pending).map_err(|reason| stale(task_id, reason))?;

        if !self.tasks.reset(task_id).await? {
            return Err(stale(task_id, "reset not applied"));
        }
        self.disarm(task_id);
        self.close(self.take_open(task_id).as_ref(), DeliveryOutcome::TimedOut)
            .await;
        tracing::info!(task_id, "Task reset to pending");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Deliveries
    // -----------------------------------------------------------------------

    fn open_map(&self) -> std::sync::MutexGuard<'_, HashMap<DbId, DeliveryHandle>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_open(&self, task_id: DbId) -> Option<DeliveryHandle> {
        self.open_map().remove(&task_id)
    }

    fn armed_map(&self) -> std::sync::MutexGuard<'_, HashMap<DbId, u64>> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every timer armed so far for the task a no-op.
    fn disarm(&self, task_id: DbId) {
        self.armed_map().remove(&task_id);
    }

    /// Rewrite a delivered message. Failures are only logged.
    async fn close(&self, delivery: Option<&DeliveryHandle>, outcome: DeliveryOutcome) {
        let Some(delivery) = delivery else { return };
        if let Err(e) = self.notifications.close(delivery, outcome).await {
            tracing::warn!(channel = %delivery.channel, ?outcome, error = %e, "Failed to update message");
        }
    }
}

fn stale(task_id: DbId, reason: impl Into<String>) -> EngineError {
    EngineError::StaleTransition {
        task_id,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::memory::{MemoryDirectory, MemoryNotifier, MemoryTasks};

    struct Fixture {
        tasks: Arc<MemoryTasks>,
        directory: Arc<MemoryDirectory>,
        notifier: Arc<MemoryNotifier>,
        controller: Arc<EscalationController>,
    }

    fn fixture() -> Fixture {
        let tasks = Arc::new(MemoryTasks::default());
        let directory = Arc::new(MemoryDirectory::default());
        let notifier = Arc::new(MemoryNotifier::default());
        let config = EngineConfig {
            escalation_timeout: Duration::from_secs(60),
            display_offset: chrono::Duration::hours(2),
            ..EngineConfig::default()
        };
        let controller = Arc::new(EscalationController::new(
            tasks.clone(),
            tasks.clone(),
            directory.clone(),
            notifier.clone(),
            &config,
        ));
        Fixture {
            tasks,
            directory,
            notifier,
            controller,
        }
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    /// A task assigned to the first of `names`, all reachable.
    async fn assigned_task(f: &Fixture, names: &[&str]) -> (DbId, Vec<DbId>) {
        let ids: Vec<DbId> = names
            .iter()
            .map(|n| f.directory.add(n, Some(format!("U-{n}")).as_deref()))
            .collect();
        f.tasks.add_plant(10, "desk-1", 1, Some(7), t0());
        let task_id = f.tasks.insert_pending(10);
        f.tasks
            .set_candidates(task_id, &ids, t0())
            .await
            .unwrap();
        (task_id, ids)
    }

    // -----------------------------------------------------------------------
    // Timeout
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn timeout_advances_to_next_candidate() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2", "p3"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;

        let later = t0() + chrono::Duration::minutes(1);
        let result = f
            .controller
            .handle_timeout(task_id, Some(ids[0]), later)
            .await
            .unwrap();

        assert_eq!(result, TimeoutResult::Advanced { next: ids[1] });
        let task = f.tasks.task(task_id);
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.assigned_employee_id, Some(ids[1]));
        assert_eq!(task.candidate_ids, vec![ids[1], ids[2]]);
        assert_eq!(task.notified_at, Some(later));
        assert_eq!(f.notifier.sent_to(), vec!["U-p1", "U-p2"]);
        assert_eq!(f.notifier.outcomes(), vec![DeliveryOutcome::TimedOut]);
    }

    #[tokio::test]
    async fn timeout_with_nobody_left_expires() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1"]).await;

        let result = f
            .controller
            .handle_timeout(task_id, Some(ids[0]), t0())
            .await
            .unwrap();

        assert_eq!(result, TimeoutResult::Expired);
        let task = f.tasks.task(task_id);
        assert_eq!(task.status, TaskStatus::Expired);
        assert_eq!(task.assigned_employee_id, None);
        assert!(task.candidate_ids.is_empty());
    }

    #[tokio::test]
    async fn timeout_for_previous_assignee_is_stale() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.controller
            .handle_timeout(task_id, Some(ids[0]), t0())
            .await
            .unwrap();

        let err = f
            .controller
            .handle_timeout(task_id, Some(ids[0]), t0())
            .await
            .unwrap_err();
        assert!(err.is_benign());
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[1]));
    }

    #[tokio::test]
    async fn timeout_after_done_is_a_no_op() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.controller
            .confirm(ConfirmRequest::operator(task_id), t0())
            .await
            .unwrap();

        let err = f
            .controller
            .handle_timeout(task_id, Some(ids[0]), t0())
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::StaleTransition { .. });
        assert_eq!(f.tasks.task(task_id).status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn timeout_write_failure_is_not_applied() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.tasks.fail_writes();

        let err = f
            .controller
            .handle_timeout(task_id, Some(ids[0]), t0())
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::Persistence(_));
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn armed_timer_escalates_without_confirmation() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[1]));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(f.tasks.task(task_id).status, TaskStatus::Expired);
        assert_eq!(f.notifier.sent_to(), vec!["U-p1", "U-p2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_assignee_still_times_out() {
        let f = fixture();
        let silent = f.directory.add("silent", None);
        let reachable = f.directory.add("p2", Some("U-p2"));
        f.tasks.add_plant(10, "desk-1", 1, Some(7), t0());
        let task_id = f.tasks.insert_pending(10);
        f.tasks
            .set_candidates(task_id, &[silent, reachable], t0())
            .await
            .unwrap();

        f.controller.notify_assignee(task_id, silent).await;
        assert!(f.notifier.sent_to().is_empty());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(reachable));
        assert_eq!(f.notifier.sent_to(), vec!["U-p2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_from_before_a_reset_does_not_cut_the_new_window_short() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        f.controller.reset(task_id).await.unwrap();
        f.tasks
            .set_candidates(task_id, &ids, t0() + chrono::Duration::seconds(30))
            .await
            .unwrap();
        f.controller.notify_assignee(task_id, ids[0]).await;

        // The first timer runs out 30s into the second window.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[0]));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[1]));
        assert_eq!(f.notifier.sent_to(), vec!["U-p1", "U-p1", "U-p2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_timer_is_ignored_after_a_sweep_escalation() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2", "p3"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        let moved = f.controller.sweep_overdue(t0() + chrono::Duration::minutes(5)).await;
        assert_eq!(moved, 1);
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[1]));

        // p1's timer runs out at 60s; p2's window started with the sweep.
        tokio::time::sleep(Duration::from_secs(55)).await;
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[1]));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[2]));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_armed_timers() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;
        f.controller.shutdown();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(f.tasks.task(task_id).assigned_employee_id, Some(ids[0]));
    }

    #[tokio::test]
    async fn sweep_moves_only_overdue_tasks() {
        let f = fixture();
        let (overdue, _) = assigned_task(&f, &["p1", "p2"]).await;
        f.tasks.add_plant(11, "desk-2", 1, Some(7), t0());
        let fresh = f.tasks.insert_pending(11);
        let p3 = f.directory.add("p3", Some("U-p3"));
        f.tasks
            .set_candidates(fresh, &[p3], t0() + chrono::Duration::seconds(30))
            .await
            .unwrap();

        let moved = f.controller.sweep_overdue(t0() + chrono::Duration::seconds(60)).await;
        assert_eq!(moved, 1);
        assert_eq!(f.tasks.task(overdue).candidate_ids.len(), 1);
        assert_eq!(f.tasks.task(fresh).status, TaskStatus::Assigned);
    }

    // -----------------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn confirmation_finishes_task_and_advances_schedule() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;
        let delivery = f.notifier.last_delivery().unwrap();

        let result = f
            .controller
            .confirm(
                ConfirmRequest {
                    task_id,
                    delivery: Some(delivery),
                    confirmed_by: Some("U-p1".into()),
                },
                t0(),
            )
            .await
            .unwrap();

        // Display offset of two hours plus seven days.
        let expected_next = t0() + chrono::Duration::hours(2) + chrono::Duration::days(7);
        assert_eq!(
            result,
            ConfirmResult::Confirmed {
                next_watering: Some(expected_next)
            }
        );
        let task = f.tasks.task(task_id);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.assigned_employee_id, None);
        assert_eq!(f.tasks.schedule(10).unwrap().next_watering, expected_next);
        assert_eq!(f.notifier.outcomes(), vec![DeliveryOutcome::Confirmed]);
        assert_eq!(f.controller.open_deliveries(), 0);
    }

    #[tokio::test]
    async fn confirmation_after_escalation_is_too_late() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;
        let old = f.notifier.last_delivery().unwrap();
        f.controller
            .handle_timeout(task_id, Some(ids[0]), t0())
            .await
            .unwrap();

        let result = f
            .controller
            .confirm(
                ConfirmRequest {
                    task_id,
                    delivery: Some(old),
                    confirmed_by: Some("U-p1".into()),
                },
                t0(),
            )
            .await
            .unwrap();

        assert_eq!(result, ConfirmResult::TooLate);
        assert_eq!(f.tasks.task(task_id).status, TaskStatus::Assigned);
        assert!(f.tasks.schedule(10).is_none());
        assert_eq!(
            f.notifier.outcomes(),
            vec![DeliveryOutcome::TimedOut, DeliveryOutcome::TooLate]
        );
    }

    #[tokio::test]
    async fn second_confirmation_does_not_advance_schedule_twice() {
        let f = fixture();
        let (task_id, _) = assigned_task(&f, &["p1"]).await;
        f.controller
            .confirm(ConfirmRequest::operator(task_id), t0())
            .await
            .unwrap();
        let first = f.tasks.schedule(10).unwrap();

        let later = t0() + chrono::Duration::days(1);
        let result = f
            .controller
            .confirm(ConfirmRequest::operator(task_id), later)
            .await
            .unwrap();
        assert_eq!(result, ConfirmResult::TooLate);
        assert_eq!(f.tasks.schedule(10).unwrap(), first);
    }

    #[tokio::test]
    async fn confirmation_by_someone_else_is_rejected() {
        let f = fixture();
        let (task_id, _) = assigned_task(&f, &["p1", "p2"]).await;
        let result = f
            .controller
            .confirm(
                ConfirmRequest {
                    task_id,
                    delivery: None,
                    confirmed_by: Some("U-p2".into()),
                },
                t0(),
            )
            .await
            .unwrap();
        assert_eq!(result, ConfirmResult::TooLate);
        assert_eq!(f.tasks.task(task_id).status, TaskStatus::Assigned);
    }

    #[tokio::test]
    async fn unknown_task_is_reported() {
        let f = fixture();
        let delivery = DeliveryHandle {
            channel: "U-x".into(),
            message_ref: "1".into(),
        };
        let result = f
            .controller
            .confirm(
                ConfirmRequest {
                    task_id: 404,
                    delivery: Some(delivery),
                    confirmed_by: None,
                },
                t0(),
            )
            .await
            .unwrap();
        assert_eq!(result, ConfirmResult::NotFound);
        assert_eq!(f.notifier.outcomes(), vec![DeliveryOutcome::NotFound]);
    }

    #[tokio::test]
    async fn missing_interval_leaves_task_assigned() {
        let f = fixture();
        let directory_id = f.directory.add("p1", Some("U-p1"));
        f.tasks.add_plant(10, "desk-1", 1, None, t0());
        let task_id = f.tasks.insert_pending(10);
        f.tasks
            .set_candidates(task_id, &[directory_id], t0())
            .await
            .unwrap();

        let err = f
            .controller
            .confirm(ConfirmRequest::operator(task_id), t0())
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::Persistence(_));
        assert_eq!(f.tasks.task(task_id).status, TaskStatus::Assigned);
    }

    #[tokio::test]
    async fn schedule_failure_still_confirms() {
        let f = fixture();
        let (task_id, _) = assigned_task(&f, &["p1"]).await;
        f.tasks.fail_schedule_writes();

        let result = f
            .controller
            .confirm(ConfirmRequest::operator(task_id), t0())
            .await
            .unwrap();
        assert_eq!(result, ConfirmResult::Confirmed { next_watering: None });
        assert_eq!(f.tasks.task(task_id).status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn racing_confirmation_and_timeout_apply_once() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1", "p2"]).await;

        let controller = f.controller.clone();
        let first = ids[0];
        let timeout = tokio::spawn(async move {
            controller.handle_timeout(task_id, Some(first), t0()).await
        });
        let confirm = f
            .controller
            .confirm(
                ConfirmRequest {
                    task_id,
                    delivery: None,
                    confirmed_by: Some("U-p1".into()),
                },
                t0(),
            )
            .await
            .unwrap();
        let timeout = timeout.await.unwrap();

        let task = f.tasks.task(task_id);
        match confirm {
            ConfirmResult::Confirmed { .. } => {
                assert!(timeout.is_err());
                assert_eq!(task.status, TaskStatus::Done);
            }
            ConfirmResult::TooLate => {
                assert_eq!(timeout.unwrap(), TimeoutResult::Advanced { next: ids[1] });
                assert_eq!(task.assigned_employee_id, Some(ids[1]));
                assert!(f.tasks.schedule(10).is_none());
            }
            ConfirmResult::NotFound => panic!("task exists"),
        }
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reset_returns_assigned_task_to_pending() {
        let f = fixture();
        let (task_id, ids) = assigned_task(&f, &["p1"]).await;
        f.controller.notify_assignee(task_id, ids[0]).await;

        f.controller.reset(task_id).await.unwrap();
        let task = f.tasks.task(task_id);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.assigned_employee_id, None);
        assert!(task.candidate_ids.is_empty());
        assert_eq!(f.controller.open_deliveries(), 0);
    }

    #[tokio::test]
    async fn reset_of_finished_task_is_stale() {
        let f = fixture();
        let (task_id, _) = assigned_task(&f, &["p1"]).await;
        f.controller
            .confirm(ConfirmRequest::operator(task_id), t0())
            .await
            .unwrap();

        let err = f.controller.reset(task_id).await.unwrap_err();
        assert!(err.is_benign());
    }
}
