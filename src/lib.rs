//! jobpool - an in-process job server for graphs of dependent jobs.
//!
//! Jobs are registered with a [`Scheduler`] together with the jobs they must
//! run after. The scheduler admits ready jobs under a concurrency cap, closes
//! jobs whose dependencies failed without running them, and reports on
//! shutdown whether every job succeeded.
//!
//! ```no_run
//! use jobpool::{CommandJob, RemoveFileJob, Scheduler};
//!
//! # async fn demo() -> Result<(), jobpool::SchedulerError> {
//! let (scheduler, task) = Scheduler::new(4)?.start();
//!
//! let canvas = scheduler
//!     .add(CommandJob::builder("convert").args(["xc:white", "canvas.png"]).build(), &[])
//!     .await?;
//! canvas.chain(RemoveFileJob::new("canvas.png")).await?;
//!
//! let all_succeeded = scheduler.shutdown().await?;
//! task.await.ok();
//! # let _ = all_succeeded;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod execution;
pub mod scheduler;
pub mod testing;

pub use config::{
    ConfigError, JobConfig, JobKindConfig, PipelineBuilder, PipelineConfig, PipelineLoader,
};
pub use core::job::{Job, JobError};
pub use core::state::{JobSnapshot, JobState, StateError};
pub use core::types::{JobId, SchedulerId};
pub use events::{Event, EventBus, EventHandler};
pub use execution::{CommandJob, CommandJobBuilder, FnJob, JobResult, RemoveFileJob};
pub use scheduler::{JobHandle, Scheduler, SchedulerError, SchedulerHandle};
