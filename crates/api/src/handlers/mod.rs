pub mod assignments;
pub mod distances;
pub mod slack;
pub mod tasks;
