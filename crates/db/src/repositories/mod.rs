//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod distance_pair_repo;
pub mod employee_repo;
pub mod location_repo;
pub mod plant_schedule_repo;
pub mod watering_task_repo;

pub use distance_pair_repo::DistancePairRepo;
pub use employee_repo::EmployeeRepo;
pub use location_repo::LocationRepo;
pub use plant_schedule_repo::PlantScheduleRepo;
pub use watering_task_repo::WateringTaskRepo;
