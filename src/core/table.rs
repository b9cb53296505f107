//! Job arena and dependency gate.
//!
//! The `JobTable` owns every registered job in insertion order. Dependencies
//! are stored as `JobId`s into the same table, so a job never holds a
//! reference to another job and cyclic graphs cannot leak memory.

use std::sync::Arc;

use super::job::Job;
use super::state::{JobSnapshot, JobState, StateError};
use super::types::JobId;

/// A registered job plus its scheduling state.
pub(crate) struct JobRecord {
    id: JobId,
    job: Arc<dyn Job>,
    state: JobState,
    successful: Option<bool>,
    dependencies: Vec<JobId>,
}

impl JobRecord {
    fn new(id: JobId, job: Arc<dyn Job>) -> Self {
        Self {
            id,
            job,
            state: JobState::Idle,
            successful: None,
            dependencies: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> JobId {
        self.id
    }

    pub(crate) fn job(&self) -> &Arc<dyn Job> {
        &self.job
    }

    pub(crate) fn name(&self) -> &str {
        self.job.name()
    }

    pub(crate) fn state(&self) -> JobState {
        self.state
    }

    pub(crate) fn successful(&self) -> Option<bool> {
        self.successful
    }

    pub(crate) fn dependencies(&self) -> &[JobId] {
        &self.dependencies
    }

    /// Admission: `Idle -> Running`.
    pub(crate) fn start(&mut self) -> Result<(), StateError> {
        self.transition(JobState::Running)
    }

    /// Worker completion: `Running -> Finished`, recording the outcome.
    pub(crate) fn finish(&mut self, successful: bool) -> Result<(), StateError> {
        if self.state != JobState::Running {
            return Err(self.invalid(JobState::Finished));
        }
        self.set_successful(successful)?;
        self.transition(JobState::Finished)
    }

    /// Closure: `Finished -> Closed`.
    pub(crate) fn close(&mut self) -> Result<(), StateError> {
        if self.state != JobState::Finished {
            return Err(self.invalid(JobState::Closed));
        }
        self.transition(JobState::Closed)
    }

    /// Failure short-circuit: `Idle -> Closed` without ever executing.
    pub(crate) fn abandon(&mut self) -> Result<(), StateError> {
        if self.state != JobState::Idle {
            return Err(self.invalid(JobState::Closed));
        }
        self.set_successful(false)?;
        self.transition(JobState::Closed)
    }

    fn set_successful(&mut self, successful: bool) -> Result<(), StateError> {
        if self.successful.is_some() {
            return Err(StateError::OutcomeAlreadySet(self.id));
        }
        self.successful = Some(successful);
        Ok(())
    }

    fn transition(&mut self, next: JobState) -> Result<(), StateError> {
        if !self.state.can_transition_to(next) {
            return Err(self.invalid(next));
        }
        self.state = next;
        Ok(())
    }

    fn invalid(&self, to: JobState) -> StateError {
        StateError::InvalidTransition {
            job: self.id,
            from: self.state,
            to,
        }
    }

    pub(crate) fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            name: self.name().to_string(),
            state: self.state,
            successful: self.successful,
            dependencies: self.dependencies.clone(),
        }
    }
}

/// Insertion-ordered arena of job records.
#[derive(Default)]
pub(crate) struct JobTable {
    records: Vec<JobRecord>,
}

impl JobTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn contains(&self, id: JobId) -> bool {
        id.index() < self.records.len()
    }

    /// Append a job and return its id.
    pub(crate) fn insert(&mut self, job: Arc<dyn Job>) -> JobId {
        let id = JobId::new(self.records.len());
        self.records.push(JobRecord::new(id, job));
        id
    }

    pub(crate) fn get(&self, id: JobId) -> Option<&JobRecord> {
        self.records.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: JobId) -> Option<&mut JobRecord> {
        self.records.get_mut(id.index())
    }

    /// Ids of all jobs in insertion order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = JobId> + use<> {
        (0..self.records.len()).map(JobId::new)
    }

    /// Append `dependency` to the prerequisites of `job`.
    ///
    /// No cycle detection is performed. Returns `false` if either id is
    /// unknown.
    pub(crate) fn add_dependency(&mut self, job: JobId, dependency: JobId) -> bool {
        if !self.contains(dependency) {
            return false;
        }
        match self.get_mut(job) {
            Some(record) => {
                record.dependencies.push(dependency);
                true
            }
            None => false,
        }
    }

    /// True iff the job is idle and every dependency closed successfully.
    pub(crate) fn should_start(&self, id: JobId) -> bool {
        let Some(record) = self.get(id) else {
            return false;
        };
        record.state == JobState::Idle
            && record
                .dependencies
                .iter()
                .all(|dep| self.closed_with(*dep, true))
    }

    /// True iff the job is idle and at least one dependency closed unsuccessfully.
    pub(crate) fn can_never_start(&self, id: JobId) -> bool {
        let Some(record) = self.get(id) else {
            return false;
        };
        record.state == JobState::Idle
            && record
                .dependencies
                .iter()
                .any(|dep| self.closed_with(*dep, false))
    }

    fn closed_with(&self, id: JobId, successful: bool) -> bool {
        self.get(id).is_some_and(|record| {
            record.state == JobState::Closed && record.successful == Some(successful)
        })
    }

    /// True iff every job is closed (vacuously true when empty).
    pub(crate) fn all_closed(&self) -> bool {
        self.records.iter().all(|r| r.state == JobState::Closed)
    }

    /// Logical AND over every job's outcome.
    pub(crate) fn all_successful(&self) -> bool {
        self.records.iter().all(|r| r.successful == Some(true))
    }

    pub(crate) fn count_in(&self, state: JobState) -> usize {
        self.records.iter().filter(|r| r.state == state).count()
    }

    pub(crate) fn snapshots(&self) -> Vec<JobSnapshot> {
        self.records.iter().map(JobRecord::snapshot).collect()
    }
}
