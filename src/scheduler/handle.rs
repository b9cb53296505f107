//! Handles for talking to a running scheduler.
//!
//! `SchedulerHandle` sends commands to the control loop; `JobHandle` names one
//! registered job and carries the scheduler handle as its (non-owning)
//! back-reference, which is what makes `chain` possible.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, oneshot};

use crate::core::job::Job;
use crate::core::state::JobSnapshot;
use crate::core::types::{JobId, SchedulerId};

use super::types::{FinalState, SchedulerCommand, SchedulerError};

/// Buffer size for the command channel between SchedulerHandle and Scheduler.
pub(crate) const COMMAND_CHANNEL_BUFFER: usize = 64;

/// Handle for controlling the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    pub(crate) id: SchedulerId,
    pub(crate) command_tx: mpsc::Sender<SchedulerCommand>,
    /// Set by the control loop right before it stops.
    pub(crate) final_state: Arc<RwLock<Option<FinalState>>>,
}

impl SchedulerHandle {
    /// Helper to send a command and wait for its response.
    async fn request<T>(
        &self,
        build_command: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
        operation: &str,
    ) -> Result<T, SchedulerError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(build_command(response_tx))
            .await
            .map_err(|_| {
                SchedulerError::ChannelError(format!("failed to send {} command", operation))
            })?;

        response_rx.await.map_err(|_| {
            SchedulerError::ChannelError(format!("failed to receive {} response", operation))
        })
    }

    /// Answer from the final job table if the control loop has stopped.
    async fn after_stop<T>(
        &self,
        error: SchedulerError,
        read: impl FnOnce(&FinalState) -> Result<T, SchedulerError>,
    ) -> Result<T, SchedulerError> {
        if !matches!(error, SchedulerError::ChannelError(_)) {
            return Err(error);
        }
        match self.final_state.read().await.as_ref() {
            Some(state) => read(state),
            None => Err(error),
        }
    }

    /// Get the identifier of the scheduler this handle controls.
    pub fn id(&self) -> SchedulerId {
        self.id
    }

    /// Register `job`, making it depend on every job in `after`.
    ///
    /// The job is moved into the scheduler, so it can be bound to exactly one
    /// scheduler. Handles from another scheduler are rejected.
    pub async fn add(
        &self,
        job: impl Job + 'static,
        after: &[JobHandle],
    ) -> Result<JobHandle, SchedulerError> {
        self.add_shared(Arc::new(job), after).await
    }

    /// Register an already shared job.
    pub async fn add_shared(
        &self,
        job: Arc<dyn Job>,
        after: &[JobHandle],
    ) -> Result<JobHandle, SchedulerError> {
        let after = after
            .iter()
            .map(|handle| self.own(handle))
            .collect::<Result<Vec<_>, _>>()?;

        let id = self
            .request(
                |response| SchedulerCommand::Add {
                    job,
                    after,
                    response,
                },
                "add",
            )
            .await??;

        Ok(JobHandle {
            id,
            scheduler: self.clone(),
        })
    }

    /// Wake the poll loop immediately instead of waiting for the next tick.
    pub async fn notify(&self) -> Result<(), SchedulerError> {
        self.command_tx
            .send(SchedulerCommand::Notify)
            .await
            .map_err(|_| SchedulerError::ChannelError("failed to send notify command".to_string()))
    }

    /// Wait until every job is closed, then stop the scheduler.
    ///
    /// Returns `true` only if every registered job succeeded. A graph with a
    /// dependency cycle never closes, so this never returns for it. Calling it
    /// again after the loop stopped returns the same result.
    pub async fn shutdown(&self) -> Result<bool, SchedulerError> {
        match self
            .request(|response| SchedulerCommand::Shutdown { response }, "shutdown")
            .await
        {
            Err(e) => self.after_stop(e, |state| Ok(state.successful)).await,
            result => result,
        }
    }

    /// Snapshot a single job.
    ///
    /// Still answers after shutdown, from the final job table.
    pub async fn status(&self, job: &JobHandle) -> Result<JobSnapshot, SchedulerError> {
        let job = self.own(job)?;
        match self
            .request(|response| SchedulerCommand::Status { job, response }, "status")
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.after_stop(e, |state| {
                    state
                        .jobs
                        .get(job.index())
                        .cloned()
                        .ok_or(SchedulerError::UnknownJob(job))
                })
                .await
            }
        }
    }

    /// Snapshot every job in insertion order.
    ///
    /// Still answers after shutdown, from the final job table.
    pub async fn jobs(&self) -> Result<Vec<JobSnapshot>, SchedulerError> {
        match self
            .request(|response| SchedulerCommand::Jobs { response }, "jobs")
            .await
        {
            Err(e) => self.after_stop(e, |state| Ok(state.jobs.clone())).await,
            result => result,
        }
    }

    /// Get the number of jobs currently counted as running.
    ///
    /// Zero once the control loop has stopped.
    pub async fn running_count(&self) -> Result<usize, SchedulerError> {
        match self
            .request(
                |response| SchedulerCommand::RunningCount { response },
                "running count",
            )
            .await
        {
            Err(e) => self.after_stop(e, |_| Ok(0)).await,
            result => result,
        }
    }

    fn own(&self, handle: &JobHandle) -> Result<JobId, SchedulerError> {
        if handle.scheduler.id == self.id {
            Ok(handle.id)
        } else {
            Err(SchedulerError::ForeignJob(handle.id))
        }
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("id", &self.id)
            .finish()
    }
}

/// Handle to a job registered with a scheduler.
#[derive(Clone)]
pub struct JobHandle {
    id: JobId,
    scheduler: SchedulerHandle,
}

impl JobHandle {
    /// Get the job's identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Get the scheduler this job is registered with.
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Append `other` to this job's prerequisites.
    ///
    /// Returns `self` so several dependencies can be added in a row. No cycle
    /// detection is performed: a cycle leaves the jobs involved idle forever.
    pub async fn add_dependency(&self, other: &JobHandle) -> Result<&Self, SchedulerError> {
        let dependency = self.scheduler.own(other)?;
        let job = self.id;
        self.scheduler
            .request(
                |response| SchedulerCommand::AddDependency {
                    job,
                    dependency,
                    response,
                },
                "add dependency",
            )
            .await??;
        Ok(self)
    }

    /// Register `next` on the same scheduler, running after this job.
    ///
    /// Returns the new job's handle so linear pipelines can be built fluently.
    pub async fn chain(&self, next: impl Job + 'static) -> Result<JobHandle, SchedulerError> {
        self.scheduler
            .add(next, std::slice::from_ref(self))
            .await
    }

    /// Snapshot this job.
    pub async fn status(&self) -> Result<JobSnapshot, SchedulerError> {
        self.scheduler.status(self).await
    }
}

impl PartialEq for JobHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.scheduler.id == other.scheduler.id
    }
}

impl Eq for JobHandle {}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("scheduler", &self.scheduler.id)
            .finish()
    }
}
