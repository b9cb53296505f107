//! Scheduler type definitions.
//!
//! This module contains the error type and the command messages the
//! scheduler's control loop accepts.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::core::job::Job;
use crate::core::state::{JobSnapshot, StateError};
use crate::core::types::JobId;

/// Errors that can occur in the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The concurrency cap must allow at least one running job.
    #[error("concurrency cap must be at least 1")]
    InvalidConcurrency,

    /// A job handle belongs to a different scheduler.
    #[error("job {0} belongs to another scheduler")]
    ForeignJob(JobId),

    /// Job not found.
    #[error("job not found: {0}")]
    UnknownJob(JobId),

    /// Channel error (the control loop has stopped).
    #[error("channel error: {0}")]
    ChannelError(String),

    /// The job state machine was violated.
    #[error("state machine violation: {0}")]
    State(#[from] StateError),
}

/// Final job table, published when the control loop stops.
///
/// Handles answer queries from it once the loop is gone.
#[derive(Debug, Clone)]
pub(crate) struct FinalState {
    pub(crate) successful: bool,
    pub(crate) jobs: Vec<JobSnapshot>,
}

/// Commands that can be sent to the scheduler's control loop.
pub(crate) enum SchedulerCommand {
    /// Register a job, optionally after other jobs.
    Add {
        job: Arc<dyn Job>,
        after: Vec<JobId>,
        response: oneshot::Sender<Result<JobId, SchedulerError>>,
    },
    /// Append a dependency to an already registered job.
    AddDependency {
        job: JobId,
        dependency: JobId,
        response: oneshot::Sender<Result<(), SchedulerError>>,
    },
    /// Run a poll pass now instead of waiting for the next tick.
    Notify,
    /// Snapshot a single job.
    Status {
        job: JobId,
        response: oneshot::Sender<Result<JobSnapshot, SchedulerError>>,
    },
    /// Snapshot every job in insertion order.
    Jobs {
        response: oneshot::Sender<Vec<JobSnapshot>>,
    },
    /// Report the current running count.
    RunningCount { response: oneshot::Sender<usize> },
    /// Wait for every job to close, then stop the loop.
    Shutdown { response: oneshot::Sender<bool> },
}
