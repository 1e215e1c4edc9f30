//! Domain core for the plant watering assignment engine.
//!
//! Pure types and algorithms with zero internal dependencies: distance
//! math, candidate ranking, the task state machine, schedule math and the
//! traits that describe every external collaborator.

pub mod distance;
pub mod error;
pub mod location;
pub mod ports;
pub mod presence;
pub mod ranking;
pub mod signing;
pub mod status;
pub mod types;
pub mod watering;
