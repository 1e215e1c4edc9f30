use crate::ports::PortError;
use crate::types::DbId;

/// Request-level domain errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Failure taxonomy for the engine's top-level operations.
///
/// `StaleTransition` and `NoCandidates` are outcomes rather than faults:
/// callers log them at debug level and carry on.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Location, presence or directory fetch failed. The run is aborted
    /// and retried on the next scheduled cycle.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A write to the distance or task store failed. The operation is
    /// treated as not applied.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// The task was no longer in the state the transition expected.
    #[error("Stale transition for task {task_id}: {reason}")]
    StaleTransition { task_id: DbId, reason: String },

    /// Ranking produced an empty list; the task routes to `expired`.
    #[error("No candidates for task {0}")]
    NoCandidates(DbId),
}

impl EngineError {
    /// Whether this error is an expected outcome that must not be
    /// reported as a failure.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EngineError::StaleTransition { .. } | EngineError::NoCandidates(_)
        )
    }
}

impl From<PortError> for EngineError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Source(msg) => EngineError::SourceUnavailable(msg),
            PortError::Persistence(msg) => EngineError::Persistence(msg),
            // Delivery failures never abort a transition; they only reach
            // this conversion when a caller chooses to propagate one.
            PortError::Delivery(msg) => EngineError::SourceUnavailable(msg),
        }
    }
}
