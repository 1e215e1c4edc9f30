//! Orchestration for plant watering assignment.
//!
//! [`Engine`] ties the pure algorithms in `sprout-core` to the ports:
//! distance builds, location sync, the assignment cycle and escalation.
//! It holds no storage of its own.

use std::sync::Arc;

use sprout_core::error::EngineError;
use sprout_core::ports::{
    DirectorySource, DistanceStore, HandleLookup, LocationSource, LocationStore, NotificationChannel,
    PresenceSource, ResourceSource, ScheduleStore, TaskStore,
};
use sprout_core::types::{DbId, Timestamp};
use sprout_core::watering::WateringTask;

pub mod assignment;
pub mod config;
pub mod directory;
pub mod distances;
pub mod escalation;
pub mod locks;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod sync;

pub use assignment::AssignmentReport;
pub use config::EngineConfig;
pub use distances::{DistanceRepository, FloorBuild, FloorSummary};
pub use escalation::{ConfirmRequest, ConfirmResult, EscalationController, TimeoutResult};
pub use sync::SyncReport;

/// Every collaborator the engine talks to.
#[derive(Clone)]
pub struct Ports {
    pub locations: Arc<dyn LocationSource>,
    pub location_store: Arc<dyn LocationStore>,
    pub resources: Arc<dyn ResourceSource>,
    pub presence: Arc<dyn PresenceSource>,
    pub directory: Arc<dyn DirectorySource>,
    /// Chat-side handle lookup; without it only stored handles are used.
    pub handles: Option<Arc<dyn HandleLookup>>,
    pub distances: Arc<dyn DistanceStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub notifications: Arc<dyn NotificationChannel>,
}

pub struct Engine {
    ports: Ports,
    config: EngineConfig,
    distances: DistanceRepository,
    escalation: Arc<EscalationController>,
}

impl Engine {
    pub fn new(ports: Ports, config: EngineConfig) -> Self {
        let distances = DistanceRepository::new(Arc::clone(&ports.distances), config.distance_page_size);
        let escalation = Arc::new(EscalationController::new(
            Arc::clone(&ports.tasks),
            Arc::clone(&ports.schedules),
            Arc::clone(&ports.directory),
            Arc::clone(&ports.notifications),
            &config,
        ));
        Self {
            ports,
            config,
            distances,
            escalation,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn escalation(&self) -> &Arc<EscalationController> {
        &self.escalation
    }

    /// Recompute and replace the distance matrix of every floor.
    pub async fn rebuild_distances(&self) -> Result<Vec<FloorBuild>, EngineError> {
        distances::build_distances(self.ports.locations.as_ref(), self.ports.distances.as_ref()).await
    }

    pub async fn distance_summary(&self) -> Result<Vec<FloorSummary>, EngineError> {
        distances::summarize(self.ports.locations.as_ref(), self.ports.distances.as_ref()).await
    }

    /// Pull floor resources into the location store and rebuild distances
    /// when anything changed.
    pub async fn sync_locations(&self) -> Result<SyncReport, EngineError> {
        let mut report =
            sync::sync_locations(self.ports.resources.as_ref(), self.ports.location_store.as_ref()).await;
        if report.changed() > 0 {
            tracing::info!(changed = report.changed(), "Locations changed, rebuilding distances");
            report.rebuild = Some(self.rebuild_distances().await?);
        }
        Ok(report)
    }

    pub async fn run_assignment(&self, now: Timestamp) -> Result<AssignmentReport, EngineError> {
        assignment::run_assignment(&self.ports, &self.distances, &self.escalation, now).await
    }

    pub async fn task(&self, task_id: DbId) -> Result<Option<WateringTask>, EngineError> {
        Ok(self.ports.tasks.find_task(task_id).await?)
    }

    pub async fn confirm(&self, request: ConfirmRequest, now: Timestamp) -> Result<ConfirmResult, EngineError> {
        self.escalation.confirm(request, now).await
    }

    pub async fn reset(&self, task_id: DbId) -> Result<(), EngineError> {
        self.escalation.reset(task_id).await
    }

    /// Fire timeouts that are overdue, e.g. after a restart.
    pub async fn sweep_timeouts(&self, now: Timestamp) -> usize {
        self.escalation.sweep_overdue(now).await
    }

    /// Stop armed escalation timers.
    pub fn shutdown(&self) {
        self.escalation.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{location, resource, MemoryPorts, MemoryResources};

    #[tokio::test]
    async fn sync_with_changes_rebuilds_distances() {
        let mem = MemoryPorts::new(vec![], vec![]).with_resources(MemoryResources::new([(
            1,
            vec![resource("a", 0.0, 0.0, 1), resource("b", 3.0, 4.0, 1)],
        )]));
        let engine = mem.engine();

        let report = engine.sync_locations().await.unwrap();
        assert_eq!(report.changed(), 2);
        let rebuild = report.rebuild.unwrap();
        assert_eq!(rebuild[0].stored, Some(3));

        let again = engine.sync_locations().await.unwrap();
        assert_eq!(again.changed(), 0);
        assert!(again.rebuild.is_none());
    }

    #[tokio::test]
    async fn summary_reflects_rebuild() {
        let mem = MemoryPorts::new(
            vec![location(1, "a", 0.0, 0.0, 1), location(2, "b", 1.0, 0.0, 1)],
            vec![],
        );
        let engine = mem.engine();
        engine.rebuild_distances().await.unwrap();

        let summary = engine.distance_summary().await.unwrap();
        assert_eq!(summary.len(), 1);
        assert!(summary[0].is_complete());
    }

    #[tokio::test]
    async fn unknown_task_is_none() {
        let engine = MemoryPorts::new(vec![], vec![]).engine();
        assert!(engine.task(1).await.unwrap().is_none());
    }
}
