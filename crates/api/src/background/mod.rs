//! Long-running background loops. Each runs until its cancellation token
//! is triggered.

pub mod assignment;
pub mod distance_refresh;
pub mod timeout_sweep;
