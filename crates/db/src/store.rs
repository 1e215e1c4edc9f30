//! [`PgStore`]: the PostgreSQL implementation of the engine's ports.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sprout_core::distance::DistancePair;
use sprout_core::location::{Location, LocationUpsert};
use sprout_core::ports::{
    DirectorySource, DistanceStore, LocationSource, LocationStore, PortError, PortResult,
    ScheduleStore, TaskStore,
};
use sprout_core::presence::{Person, PresentPerson};
use sprout_core::status::TaskStatus;
use sprout_core::types::{DbId, Floor, Timestamp};
use sprout_core::watering::{
    AssignableTask, CareInterval, ScheduleAdvance, TaskSummary, WateringTask,
};

use crate::models::employee::CreateEmployee;
use crate::repositories::{
    DistancePairRepo, EmployeeRepo, LocationRepo, PlantScheduleRepo, WateringTaskRepo,
};
use crate::DbPool;

fn persistence(err: sqlx::Error) -> PortError {
    PortError::Persistence(err.to_string())
}

/// Pool-backed store handed to the engine.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl LocationSource for PgStore {
    async fn list_locations(&self) -> PortResult<Vec<Location>> {
        let rows = LocationRepo::list_all(&self.pool).await.map_err(persistence)?;
        Ok(rows.into_iter().map(Location::from).collect())
    }
}

#[async_trait]
impl LocationStore for PgStore {
    async fn upsert_location(&self, location: &LocationUpsert) -> PortResult<bool> {
        LocationRepo::upsert(&self.pool, location)
            .await
            .map_err(persistence)
    }
}

#[async_trait]
impl DirectorySource for PgStore {
    async fn register(&self, people: &[PresentPerson]) -> PortResult<u64> {
        // One entry per email; people without an email cannot be joined.
        let mut by_mail: BTreeMap<String, CreateEmployee> = BTreeMap::new();
        for person in people {
            if let Some(mail) = person.email_key() {
                by_mail.entry(mail.clone()).or_insert_with(|| CreateEmployee {
                    real_name: person.display_name(),
                    mail,
                });
            }
        }
        let entries: Vec<CreateEmployee> = by_mail.into_values().collect();
        EmployeeRepo::create_missing(&self.pool, &entries)
            .await
            .map_err(persistence)
    }

    async fn resolve_by_email(&self, emails: &[String]) -> PortResult<Vec<Person>> {
        let rows = EmployeeRepo::list_by_mails(&self.pool, emails)
            .await
            .map_err(persistence)?;
        Ok(rows.into_iter().map(Person::from).collect())
    }

    async fn find_person(&self, id: DbId) -> PortResult<Option<Person>> {
        let row = EmployeeRepo::find_by_id(&self.pool, id)
            .await
            .map_err(persistence)?;
        Ok(row.map(Person::from))
    }

    async fn set_messaging_handle(&self, id: DbId, handle: &str) -> PortResult<()> {
        EmployeeRepo::set_messaging_handle(&self.pool, id, handle)
            .await
            .map_err(persistence)
    }
}

#[async_trait]
impl DistanceStore for PgStore {
    async fn replace_floor(&self, floor: Floor, pairs: &[DistancePair]) -> PortResult<u64> {
        DistancePairRepo::replace_floor(&self.pool, floor, pairs)
            .await
            .map_err(persistence)
    }

    async fn count_pairs(&self) -> PortResult<i64> {
        DistancePairRepo::count(&self.pool).await.map_err(persistence)
    }

    async fn count_by_floor(&self) -> PortResult<BTreeMap<Floor, i64>> {
        let rows = DistancePairRepo::count_by_floor(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(rows.into_iter().map(|r| (r.floor, r.pairs)).collect())
    }

    async fn fetch_page(&self, offset: i64, limit: i64) -> PortResult<Vec<DistancePair>> {
        let rows = DistancePairRepo::fetch_page(&self.pool, offset, limit)
            .await
            .map_err(persistence)?;
        let fetched = rows.len();
        let pairs: Vec<DistancePair> = rows.into_iter().filter_map(|r| r.into_pair()).collect();
        if pairs.len() < fetched {
            tracing::debug!(
                skipped = fetched - pairs.len(),
                offset,
                "Skipped distance pairs without a distance",
            );
        }
        Ok(pairs)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn pending_tasks(&self) -> PortResult<Vec<AssignableTask>> {
        let rows = WateringTaskRepo::list_pending_details(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(rows.into_iter().map(|r| r.into_assignable()).collect())
    }

    async fn find_task(&self, task_id: DbId) -> PortResult<Option<WateringTask>> {
        let row = WateringTaskRepo::find_by_id(&self.pool, task_id)
            .await
            .map_err(persistence)?;
        row.map(|r| r.into_task()).transpose().map_err(persistence)
    }

    async fn task_summary(&self, task_id: DbId) -> PortResult<Option<TaskSummary>> {
        let row = WateringTaskRepo::find_detail(&self.pool, task_id)
            .await
            .map_err(persistence)?;
        Ok(row.map(|r| r.summary()))
    }

    async fn set_candidates(
        &self,
        task_id: DbId,
        candidate_ids: &[DbId],
        now: Timestamp,
    ) -> PortResult<Option<TaskStatus>> {
        WateringTaskRepo::set_candidates(&self.pool, task_id, candidate_ids, now)
            .await
            .map_err(persistence)
    }

    async fn advance_to_next(
        &self,
        task_id: DbId,
        expected_assignee: Option<DbId>,
        remaining: &[DbId],
        now: Timestamp,
    ) -> PortResult<bool> {
        WateringTaskRepo::advance_to_next(&self.pool, task_id, expected_assignee, remaining, now)
            .await
            .map_err(persistence)
    }

    async fn mark_expired(&self, task_id: DbId, expected_assignee: Option<DbId>) -> PortResult<bool> {
        WateringTaskRepo::mark_expired(&self.pool, task_id, expected_assignee)
            .await
            .map_err(persistence)
    }

    async fn mark_done(&self, task_id: DbId) -> PortResult<bool> {
        WateringTaskRepo::mark_done(&self.pool, task_id)
            .await
            .map_err(persistence)
    }

    async fn overdue_assigned(&self, cutoff: Timestamp) -> PortResult<Vec<WateringTask>> {
        let rows = WateringTaskRepo::list_overdue_assigned(&self.pool, cutoff)
            .await
            .map_err(persistence)?;
        rows.into_iter()
            .map(|r| r.into_task().map_err(persistence))
            .collect()
    }

    async fn reset(&self, task_id: DbId) -> PortResult<bool> {
        WateringTaskRepo::reset(&self.pool, task_id)
            .await
            .map_err(persistence)
    }
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn create_due_tasks(&self, now: Timestamp) -> PortResult<u64> {
        PlantScheduleRepo::create_due_tasks(&self.pool, now)
            .await
            .map_err(persistence)
    }

    async fn care_interval(&self, task_id: DbId) -> PortResult<Option<CareInterval>> {
        let row = PlantScheduleRepo::care_interval_for_task(&self.pool, task_id)
            .await
            .map_err(persistence)?;
        Ok(row.map(CareInterval::from))
    }

    async fn advance_schedule(&self, plant_id: DbId, advance: &ScheduleAdvance) -> PortResult<()> {
        PlantScheduleRepo::advance(
            &self.pool,
            plant_id,
            advance.last_watered,
            advance.next_watering,
        )
        .await
        .map_err(persistence)
    }
}
