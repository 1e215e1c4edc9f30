//! Row structs for each table.
//!
//! Each submodule contains a `FromRow` struct matching the database row
//! and the conversion into the matching `sprout-core` domain type.

pub mod distance_pair;
pub mod employee;
pub mod location;
pub mod plant_schedule;
pub mod watering_task;
