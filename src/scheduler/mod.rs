//! Scheduler engine for dependent jobs.
//!
//! This module provides the control loop that admits ready jobs under a
//! concurrency cap, closes finished ones and answers shutdown once every job
//! is closed.

mod engine;
mod handle;
mod types;

pub use engine::Scheduler;
pub use handle::{JobHandle, SchedulerHandle};
pub use types::SchedulerError;
