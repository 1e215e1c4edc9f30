//! Watering task status and its state machine.
//!
//! Discriminants match the seed data order (1-based) in the
//! `task_statuses` lookup table.

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a status by its database ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Lower-case name as stored in the lookup table.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Watering task lifecycle status.
    TaskStatus {
        /// Created, not yet ranked.
        Pending = 1 => "pending",
        /// A candidate is the current head and has been notified.
        Assigned = 2 => "assigned",
        /// Confirmed by the assignee.
        Done = 3 => "done",
        /// No viable candidate remained.
        Expired = 4 => "expired",
    }
}

impl TaskStatus {
    /// `done` and `expired` accept no further engine transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Expired)
    }

    /// Open tasks block creation of another task for the same plant.
    /// Expired tasks do not, so a plant is never stuck after escalation
    /// ran out of candidates.
    pub fn blocks_new_task(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Assigned)
    }
}

pub mod state_machine {
    use super::TaskStatus;

    /// Returns the set of statuses reachable from `from`.
    ///
    /// `Assigned -> Assigned` is escalation to the next candidate.
    /// `Assigned -> Pending` is the operator reset used to reconcile a
    /// task whose finalization failed half-way.
    pub fn valid_transitions(from: TaskStatus) -> &'static [TaskStatus] {
        match from {
            TaskStatus::Pending => &[TaskStatus::Assigned, TaskStatus::Expired],
            TaskStatus::Assigned => &[
                TaskStatus::Assigned,
                TaskStatus::Done,
                TaskStatus::Expired,
                TaskStatus::Pending,
            ],
            TaskStatus::Done | TaskStatus::Expired => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: TaskStatus, to: TaskStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: TaskStatus, to: TaskStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!(
                "Invalid transition: {from} ({}) -> {to} ({})",
                from.id(),
                to.id()
            ))
        }
    }
}
