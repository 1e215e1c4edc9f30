//! In-memory implementations of every port, for tests.
//!
//! Each fake can be told to fail so error paths are reachable without a
//! database or network.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sprout_core::distance::DistancePair;
use sprout_core::location::{Location, LocationUpsert};
use sprout_core::ports::{
    DeliveryHandle, DeliveryOutcome, DirectorySource, DistanceStore, HandleLookup, LocationSource,
    LocationStore, NotificationChannel, PortError, PortResult, PresenceSource, ResourceSource,
    ScheduleStore, TaskStore,
};
use sprout_core::presence::{Booking, Person, PresentPerson};
use sprout_core::status::TaskStatus;
use sprout_core::types::{DbId, Floor, Timestamp};
use sprout_core::watering::{AssignableTask, CareInterval, ScheduleAdvance, TaskSummary, WateringTask};

use crate::config::EngineConfig;
use crate::{Engine, Ports};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check(flag: &AtomicBool, what: &str) -> PortResult<()> {
    if flag.load(Ordering::SeqCst) {
        Err(PortError::Persistence(format!("{what} failed")))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn location(id: DbId, external_id: &str, x: f64, y: f64, floor: Floor) -> Location {
    Location {
        id,
        name: format!("Desk {external_id}"),
        external_id: external_id.to_string(),
        x,
        y,
        floor,
    }
}

pub fn resource(external_id: &str, x: f64, y: f64, floor: Floor) -> LocationUpsert {
    LocationUpsert {
        external_id: external_id.to_string(),
        name: format!("Desk {external_id}"),
        x,
        y,
        floor,
    }
}

pub fn booking(location: &str, user: &str, email: Option<&str>, floor: Floor) -> Booking {
    Booking {
        location_external_id: location.to_string(),
        person: PresentPerson {
            external_id: user.to_string(),
            first_name: user.to_string(),
            last_name: String::new(),
            email: email.map(String::from),
        },
        floor,
        starts_at: None,
        ends_at: None,
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLocations {
    rows: Mutex<Vec<Location>>,
    failing: AtomicBool,
}

impl MemoryLocations {
    pub fn new(rows: Vec<Location>) -> Self {
        Self {
            rows: Mutex::new(rows),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn push(&self, location: Location) {
        lock(&self.rows).push(location);
    }

    pub fn all(&self) -> Vec<Location> {
        lock(&self.rows).clone()
    }
}

#[async_trait]
impl LocationSource for MemoryLocations {
    async fn list_locations(&self) -> PortResult<Vec<Location>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Source("locations offline".into()));
        }
        Ok(self.all())
    }
}

#[async_trait]
impl LocationStore for MemoryLocations {
    async fn upsert_location(&self, upsert: &LocationUpsert) -> PortResult<bool> {
        check(&self.failing, "location upsert")?;
        let mut rows = lock(&self.rows);
        if let Some(row) = rows.iter_mut().find(|l| l.external_id == upsert.external_id) {
            let unchanged = row.name == upsert.name
                && row.x == upsert.x
                && row.y == upsert.y
                && row.floor == upsert.floor;
            if unchanged {
                return Ok(false);
            }
            row.name = upsert.name.clone();
            row.x = upsert.x;
            row.y = upsert.y;
            row.floor = upsert.floor;
            return Ok(true);
        }
        let id = rows.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        rows.push(Location {
            id,
            name: upsert.name.clone(),
            external_id: upsert.external_id.clone(),
            x: upsert.x,
            y: upsert.y,
            floor: upsert.floor,
        });
        Ok(true)
    }
}

/// Floor resources keyed by floor.
#[derive(Default)]
pub struct MemoryResources {
    floors: BTreeMap<Floor, Vec<LocationUpsert>>,
    failing: Mutex<HashSet<Floor>>,
}

impl MemoryResources {
    pub fn new(floors: impl IntoIterator<Item = (Floor, Vec<LocationUpsert>)>) -> Self {
        Self {
            floors: floors.into_iter().collect(),
            failing: Mutex::default(),
        }
    }

    pub fn fail_floor(&self, floor: Floor) {
        lock(&self.failing).insert(floor);
    }
}

#[async_trait]
impl ResourceSource for MemoryResources {
    fn floors(&self) -> Vec<Floor> {
        self.floors.keys().copied().collect()
    }

    async fn resources_for_floor(&self, floor: Floor) -> PortResult<Vec<LocationUpsert>> {
        if lock(&self.failing).contains(&floor) {
            return Err(PortError::Source(format!("floor {floor} offline")));
        }
        Ok(self.floors.get(&floor).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Distances
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryDistanceStore {
    pairs: Mutex<Vec<DistancePair>>,
    failing_floors: Mutex<HashSet<Floor>>,
    fail_pages_from: Mutex<Option<i64>>,
    failing_count: AtomicBool,
    page_requests: AtomicUsize,
}

impl MemoryDistanceStore {
    pub fn fail_replace_for(&self, floor: Floor) {
        lock(&self.failing_floors).insert(floor);
    }

    /// Fail every page request starting at or after `offset`.
    pub fn fail_pages_from(&self, offset: i64) {
        *lock(&self.fail_pages_from) = Some(offset);
    }

    pub fn fail_count(&self) {
        self.failing_count.store(true, Ordering::SeqCst);
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DistanceStore for MemoryDistanceStore {
    async fn replace_floor(&self, floor: Floor, pairs: &[DistancePair]) -> PortResult<u64> {
        if lock(&self.failing_floors).contains(&floor) {
            return Err(PortError::Persistence(format!("replace of floor {floor} failed")));
        }
        let mut stored = lock(&self.pairs);
        stored.retain(|p| p.floor != floor);
        stored.extend_from_slice(pairs);
        Ok(pairs.len() as u64)
    }

    async fn count_pairs(&self) -> PortResult<i64> {
        check(&self.failing_count, "count")?;
        Ok(lock(&self.pairs).len() as i64)
    }

    async fn count_by_floor(&self) -> PortResult<BTreeMap<Floor, i64>> {
        check(&self.failing_count, "count")?;
        let mut counts = BTreeMap::new();
        for pair in lock(&self.pairs).iter() {
            *counts.entry(pair.floor).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn fetch_page(&self, offset: i64, limit: i64) -> PortResult<Vec<DistancePair>> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        if lock(&self.fail_pages_from).is_some_and(|from| offset >= from) {
            return Err(PortError::Persistence(format!("page at {offset} failed")));
        }
        let pairs = lock(&self.pairs);
        let start = usize::try_from(offset).unwrap_or(0).min(pairs.len());
        let end = start.saturating_add(usize::try_from(limit).unwrap_or(0)).min(pairs.len());
        Ok(pairs[start..end].to_vec())
    }
}

// ---------------------------------------------------------------------------
// Presence and directory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryPresence {
    bookings: HashMap<Floor, Vec<Booking>>,
    failing: Mutex<HashSet<Floor>>,
    requests: Mutex<Vec<Floor>>,
}

impl MemoryPresence {
    pub fn new(bookings: Vec<Booking>) -> Self {
        let mut by_floor: HashMap<Floor, Vec<Booking>> = HashMap::new();
        for b in bookings {
            by_floor.entry(b.floor).or_default().push(b);
        }
        Self {
            bookings: by_floor,
            ..Self::default()
        }
    }

    pub fn fail_floor(&self, floor: Floor) {
        lock(&self.failing).insert(floor);
    }

    pub fn restore_floor(&self, floor: Floor) {
        lock(&self.failing).remove(&floor);
    }

    /// Floors queried so far, in call order.
    pub fn requests(&self) -> Vec<Floor> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PresenceSource for MemoryPresence {
    async fn bookings_for_floor(&self, floor: Floor) -> PortResult<Vec<Booking>> {
        lock(&self.requests).push(floor);
        if lock(&self.failing).contains(&floor) {
            return Err(PortError::Source(format!("presence for floor {floor} unavailable")));
        }
        Ok(self.bookings.get(&floor).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemoryDirectory {
    people: Mutex<Vec<Person>>,
    failing: AtomicBool,
}

impl MemoryDirectory {
    /// Add a person directly. Their email is `{name}@example.com`.
    pub fn add(&self, name: &str, handle: Option<&str>) -> DbId {
        let mut people = lock(&self.people);
        let id = people.len() as DbId + 1;
        people.push(Person {
            id,
            display_name: name.to_string(),
            email: Some(format!("{name}@example.com")),
            messaging_handle: handle.map(String::from),
        });
        id
    }

    pub fn find(&self, id: DbId) -> Option<Person> {
        lock(&self.people).iter().find(|p| p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.people).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn available(&self) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PortError::Source("directory offline".into()))
        } else {
            Ok(())
        }
    }
}

fn email_of(person: &Person) -> Option<String> {
    person.email.as_deref().map(str::to_lowercase)
}

#[async_trait]
impl DirectorySource for MemoryDirectory {
    async fn register(&self, people: &[PresentPerson]) -> PortResult<u64> {
        self.available()?;
        let mut rows = lock(&self.people);
        let mut created = 0;
        for person in people {
            let Some(key) = person.email_key() else { continue };
            if rows.iter().any(|p| email_of(p).as_deref() == Some(key.as_str())) {
                continue;
            }
            let id = rows.len() as DbId + 1;
            rows.push(Person {
                id,
                display_name: person.display_name(),
                email: Some(key),
                messaging_handle: None,
            });
            created += 1;
        }
        Ok(created)
    }

    async fn resolve_by_email(&self, emails: &[String]) -> PortResult<Vec<Person>> {
        self.available()?;
        Ok(lock(&self.people)
            .iter()
            .filter(|p| email_of(p).is_some_and(|e| emails.contains(&e)))
            .cloned()
            .collect())
    }

    async fn find_person(&self, id: DbId) -> PortResult<Option<Person>> {
        self.available()?;
        Ok(self.find(id))
    }

    async fn set_messaging_handle(&self, id: DbId, handle: &str) -> PortResult<()> {
        self.available()?;
        if let Some(p) = lock(&self.people).iter_mut().find(|p| p.id == id) {
            p.messaging_handle = Some(handle.to_string());
        }
        Ok(())
    }
}

/// Chat accounts keyed by lower-case email.
#[derive(Default)]
pub struct MemoryHandles {
    handles: Mutex<HashMap<String, String>>,
}

impl MemoryHandles {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let handles = Self::default();
        for (email, handle) in entries {
            handles.insert(email, handle);
        }
        handles
    }

    pub fn insert(&self, email: &str, handle: &str) {
        lock(&self.handles).insert(email.to_lowercase(), handle.to_string());
    }
}

#[async_trait]
impl HandleLookup for MemoryHandles {
    async fn lookup_handle(&self, email: &str) -> PortResult<Option<String>> {
        Ok(lock(&self.handles).get(&email.to_lowercase()).cloned())
    }
}

// ---------------------------------------------------------------------------
// Tasks and schedules
// ---------------------------------------------------------------------------

struct Plant {
    location_external_id: String,
    floor: Floor,
    interval_days: Option<i32>,
    next_watering: Timestamp,
    advanced: Option<ScheduleAdvance>,
}

#[derive(Default)]
struct TaskState {
    plants: BTreeMap<DbId, Plant>,
    tasks: BTreeMap<DbId, WateringTask>,
}

impl TaskState {
    fn insert(&mut self, plant_id: DbId, now: Timestamp) -> DbId {
        let id = self.tasks.keys().max().copied().unwrap_or(0) + 1;
        self.tasks.insert(
            id,
            WateringTask {
                id,
                plant_id,
                status: TaskStatus::Pending,
                candidate_ids: Vec::new(),
                assigned_employee_id: None,
                notified_at: None,
                created_at: now,
            },
        );
        id
    }

    fn summary(&self, task: &WateringTask) -> TaskSummary {
        let location = self
            .plants
            .get(&task.plant_id)
            .map(|p| p.location_external_id.clone())
            .unwrap_or_default();
        TaskSummary {
            task_id: task.id,
            plant_name: Some(format!("Plant {}", task.plant_id)),
            location_name: location,
            volume_ml: Some(250),
            method: None,
            image_url: None,
        }
    }

    fn assigned_to(&mut self, task_id: DbId, expected: Option<DbId>) -> Option<&mut WateringTask> {
        self.tasks
            .get_mut(&task_id)
            .filter(|t| t.status == TaskStatus::Assigned && t.assigned_employee_id == expected)
    }
}

/// Tasks and plant schedules with the same conditional-update semantics
/// as the database.
#[derive(Default)]
pub struct MemoryTasks {
    state: Mutex<TaskState>,
    failing_writes: AtomicBool,
    failing_reads: AtomicBool,
    failing_due: AtomicBool,
    failing_schedule: AtomicBool,
}

impl MemoryTasks {
    pub fn add_plant(
        &self,
        plant_id: DbId,
        location_external_id: &str,
        floor: Floor,
        interval_days: Option<i32>,
        next_watering: Timestamp,
    ) {
        lock(&self.state).plants.insert(
            plant_id,
            Plant {
                location_external_id: location_external_id.to_string(),
                floor,
                interval_days,
                next_watering,
                advanced: None,
            },
        );
    }

    pub fn insert_pending(&self, plant_id: DbId) -> DbId {
        let mut state = lock(&self.state);
        let now = state
            .plants
            .get(&plant_id)
            .map(|p| p.next_watering)
            .unwrap_or_default();
        state.insert(plant_id, now)
    }

    /// Panics when the task does not exist.
    pub fn task(&self, task_id: DbId) -> WateringTask {
        lock(&self.state).tasks[&task_id].clone()
    }

    pub fn all_tasks(&self) -> Vec<WateringTask> {
        lock(&self.state).tasks.values().cloned().collect()
    }

    /// The last schedule written for `plant_id`.
    pub fn schedule(&self, plant_id: DbId) -> Option<ScheduleAdvance> {
        lock(&self.state).plants.get(&plant_id).and_then(|p| p.advanced)
    }

    pub fn fail_writes(&self) {
        self.failing_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.failing_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_due(&self) {
        self.failing_due.store(true, Ordering::SeqCst);
    }

    pub fn fail_schedule_writes(&self) {
        self.failing_schedule.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskStore for MemoryTasks {
    async fn pending_tasks(&self) -> PortResult<Vec<AssignableTask>> {
        check(&self.failing_reads, "pending tasks")?;
        let state = lock(&self.state);
        Ok(state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter_map(|t| {
                let plant = state.plants.get(&t.plant_id)?;
                Some(AssignableTask {
                    task_id: t.id,
                    plant_id: t.plant_id,
                    location_external_id: plant.location_external_id.clone(),
                    floor: plant.floor,
                    summary: state.summary(t),
                })
            })
            .collect())
    }

    async fn find_task(&self, task_id: DbId) -> PortResult<Option<WateringTask>> {
        check(&self.failing_reads, "find task")?;
        Ok(lock(&self.state).tasks.get(&task_id).cloned())
    }

    async fn task_summary(&self, task_id: DbId) -> PortResult<Option<TaskSummary>> {
        check(&self.failing_reads, "task summary")?;
        let state = lock(&self.state);
        Ok(state.tasks.get(&task_id).map(|t| state.summary(t)))
    }

    async fn set_candidates(
        &self,
        task_id: DbId,
        candidate_ids: &[DbId],
        now: Timestamp,
    ) -> PortResult<Option<TaskStatus>> {
        check(&self.failing_writes, "set candidates")?;
        let mut state = lock(&self.state);
        let Some(task) = state
            .tasks
            .get_mut(&task_id)
            .filter(|t| t.status == TaskStatus::Pending)
        else {
            return Ok(None);
        };
        task.candidate_ids = candidate_ids.to_vec();
        task.assigned_employee_id = candidate_ids.first().copied();
        if task.assigned_employee_id.is_some() {
            task.status = TaskStatus::Assigned;
            task.notified_at = Some(now);
        } else {
            task.status = TaskStatus::Expired;
        }
        Ok(Some(task.status))
    }

    async fn advance_to_next(
        &self,
        task_id: DbId,
        expected_assignee: Option<DbId>,
        remaining: &[DbId],
        now: Timestamp,
    ) -> PortResult<bool> {
        check(&self.failing_writes, "advance")?;
        let mut state = lock(&self.state);
        let Some(task) = state.assigned_to(task_id, expected_assignee) else {
            return Ok(false);
        };
        task.candidate_ids = remaining.to_vec();
        task.assigned_employee_id = remaining.first().copied();
        task.notified_at = Some(now);
        Ok(true)
    }

    async fn mark_expired(&self, task_id: DbId, expected_assignee: Option<DbId>) -> PortResult<bool> {
        check(&self.failing_writes, "expire")?;
        let mut state = lock(&self.state);
        let Some(task) = state.assigned_to(task_id, expected_assignee) else {
            return Ok(false);
        };
        task.status = TaskStatus::Expired;
        task.assigned_employee_id = None;
        task.candidate_ids.clear();
        Ok(true)
    }

    async fn mark_done(&self, task_id: DbId) -> PortResult<bool> {
        check(&self.failing_writes, "done")?;
        let mut state = lock(&self.state);
        let Some(task) = state
            .tasks
            .get_mut(&task_id)
            .filter(|t| t.status == TaskStatus::Assigned)
        else {
            return Ok(false);
        };
        task.status = TaskStatus::Done;
        task.assigned_employee_id = None;
        task.candidate_ids.clear();
        Ok(true)
    }

    async fn overdue_assigned(&self, cutoff: Timestamp) -> PortResult<Vec<WateringTask>> {
        check(&self.failing_reads, "overdue")?;
        Ok(lock(&self.state)
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Assigned)
            .filter(|t| t.notified_at.map_or(true, |at| at <= cutoff))
            .cloned()
            .collect())
    }

    async fn reset(&self, task_id: DbId) -> PortResult<bool> {
        check(&self.failing_writes, "reset")?;
        let mut state = lock(&self.state);
        let Some(task) = state
            .tasks
            .get_mut(&task_id)
            .filter(|t| t.status == TaskStatus::Assigned)
        else {
            return Ok(false);
        };
        task.status = TaskStatus::Pending;
        task.assigned_employee_id = None;
        task.candidate_ids.clear();
        task.notified_at = None;
        Ok(true)
    }
}

#[async_trait]
impl ScheduleStore for MemoryTasks {
    async fn create_due_tasks(&self, now: Timestamp) -> PortResult<u64> {
        check(&self.failing_due, "due tasks")?;
        let mut state = lock(&self.state);
        let due: Vec<DbId> = state
            .plants
            .iter()
            .filter(|(_, p)| p.next_watering < now)
            .map(|(id, _)| *id)
            .filter(|id| {
                !state
                    .tasks
                    .values()
                    .any(|t| t.plant_id == *id && t.status.blocks_new_task())
            })
            .collect();
        for plant_id in &due {
            state.insert(*plant_id, now);
        }
        Ok(due.len() as u64)
    }

    async fn care_interval(&self, task_id: DbId) -> PortResult<Option<CareInterval>> {
        check(&self.failing_reads, "care interval")?;
        let state = lock(&self.state);
        Ok(state.tasks.get(&task_id).and_then(|t| {
            let plant = state.plants.get(&t.plant_id)?;
            Some(CareInterval {
                plant_id: t.plant_id,
                interval_days: plant.interval_days?,
            })
        }))
    }

    async fn advance_schedule(&self, plant_id: DbId, advance: &ScheduleAdvance) -> PortResult<()> {
        check(&self.failing_schedule, "schedule advance")?;
        if let Some(plant) = lock(&self.state).plants.get_mut(&plant_id) {
            plant.next_watering = advance.next_watering;
            plant.advanced = Some(*advance);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Records every message sent and closed.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(String, DbId, DeliveryHandle)>>,
    closed: Mutex<Vec<(DeliveryHandle, DeliveryOutcome)>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Handles notified so far, in order.
    pub fn sent_to(&self) -> Vec<String> {
        lock(&self.sent).iter().map(|(h, _, _)| h.clone()).collect()
    }

    /// Task ids notified so far, in order.
    pub fn sent_tasks(&self) -> Vec<DbId> {
        lock(&self.sent).iter().map(|(_, t, _)| *t).collect()
    }

    pub fn last_delivery(&self) -> Option<DeliveryHandle> {
        lock(&self.sent).last().map(|(_, _, d)| d.clone())
    }

    pub fn outcomes(&self) -> Vec<DeliveryOutcome> {
        lock(&self.closed).iter().map(|(_, o)| *o).collect()
    }
}

#[async_trait]
impl NotificationChannel for MemoryNotifier {
    async fn send(&self, handle: &str, summary: &TaskSummary) -> PortResult<DeliveryHandle> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Delivery("chat offline".into()));
        }
        let mut sent = lock(&self.sent);
        let delivery = DeliveryHandle {
            channel: handle.to_string(),
            message_ref: format!("{}.{}", summary.task_id, sent.len() + 1),
        };
        sent.push((handle.to_string(), summary.task_id, delivery.clone()));
        Ok(delivery)
    }

    async fn close(&self, delivery: &DeliveryHandle, outcome: DeliveryOutcome) -> PortResult<()> {
        lock(&self.closed).push((delivery.clone(), outcome));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Every fake, shared with the [`Ports`] handed to an [`Engine`], so tests
/// can arrange state and inspect effects.
pub struct MemoryPorts {
    pub locations: Arc<MemoryLocations>,
    pub resources: Arc<MemoryResources>,
    pub presence: Arc<MemoryPresence>,
    pub directory: Arc<MemoryDirectory>,
    pub handles: Arc<MemoryHandles>,
    pub distances: Arc<MemoryDistanceStore>,
    pub tasks: Arc<MemoryTasks>,
    pub notifier: Arc<MemoryNotifier>,
    pub config: EngineConfig,
}

impl MemoryPorts {
    pub fn new(locations: Vec<Location>, bookings: Vec<Booking>) -> Self {
        Self {
            locations: Arc::new(MemoryLocations::new(locations)),
            resources: Arc::new(MemoryResources::default()),
            presence: Arc::new(MemoryPresence::new(bookings)),
            directory: Arc::new(MemoryDirectory::default()),
            handles: Arc::new(MemoryHandles::default()),
            distances: Arc::new(MemoryDistanceStore::default()),
            tasks: Arc::new(MemoryTasks::default()),
            notifier: Arc::new(MemoryNotifier::default()),
            config: EngineConfig::default(),
        }
    }

    pub fn with_resources(mut self, resources: MemoryResources) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    pub fn ports(&self) -> Ports {
        Ports {
            locations: self.locations.clone(),
            location_store: self.locations.clone(),
            resources: self.resources.clone(),
            presence: self.presence.clone(),
            directory: self.directory.clone(),
            handles: Some(self.handles.clone()),
            distances: self.distances.clone(),
            tasks: self.tasks.clone(),
            schedules: self.tasks.clone(),
            notifications: self.notifier.clone(),
        }
    }

    pub fn engine(&self) -> Engine {
        Engine::new(self.ports(), self.config.clone())
    }
}
