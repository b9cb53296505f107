//! Job state machine.
//!
//! Every job moves through `Idle -> Running -> Finished -> Closed`, or jumps
//! straight from `Idle` to `Closed` when one of its dependencies failed.
//! `Closed` is terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::types::JobId;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Registered, waiting for its dependencies and a free slot.
    Idle,
    /// Admitted; a worker is executing the job.
    Running,
    /// The worker returned; waiting for the scheduler to close it.
    Finished,
    /// Terminal. The outcome is final.
    Closed,
}

impl JobState {
    /// Check whether the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Closed)
    }

    /// Check whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Idle, JobState::Running)
                | (JobState::Running, JobState::Finished)
                | (JobState::Finished, JobState::Closed)
                | (JobState::Idle, JobState::Closed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Finished => "finished",
            JobState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Violations of the job state machine.
///
/// These are programming errors inside the scheduler, never job failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Attempted a transition the state machine does not allow.
    #[error("job {job} cannot move from {from} to {to}")]
    InvalidTransition {
        job: JobId,
        from: JobState,
        to: JobState,
    },

    /// Attempted to record a second outcome for a job.
    #[error("outcome of job {0} is already set")]
    OutcomeAlreadySet(JobId),
}

/// Point-in-time view of a registered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// The job's identifier.
    pub id: JobId,
    /// The job's display name.
    pub name: String,
    /// Current state.
    pub state: JobState,
    /// Outcome, `None` until the job finished or was short-circuited.
    pub successful: Option<bool>,
    /// Prerequisites in the order they were added.
    pub dependencies: Vec<JobId>,
}

impl JobSnapshot {
    /// Check whether the job closed successfully.
    pub fn succeeded(&self) -> bool {
        self.state == JobState::Closed && self.successful == Some(true)
    }

    /// Check whether the job closed unsuccessfully.
    pub fn failed(&self) -> bool {
        self.state == JobState::Closed && self.successful == Some(false)
    }
}
