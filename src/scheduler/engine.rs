//! Scheduler engine implementation.
//!
//! The scheduler is responsible for:
//! - Registering jobs and their dependency edges
//! - Closing finished jobs and short-circuiting jobs whose dependencies failed
//! - Admitting ready jobs under the concurrency cap
//! - Answering shutdown once every job is closed
//! - Event emission
//!
//! All scheduling state lives in a single control task. Handles talk to it
//! over a command channel and workers report back over a completion channel,
//! so every poll pass and every `add` is serialized without a lock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::core::job::Job;
use crate::core::state::JobState;
use crate::core::table::JobTable;
use crate::core::types::{JobId, SchedulerId};
use crate::events::{Event, EventBus};
use crate::execution::JobResult;
use crate::execution::worker;

use super::handle::{COMMAND_CHANNEL_BUFFER, SchedulerHandle};
use super::types::{FinalState, SchedulerCommand, SchedulerError};

/// Interval between poll passes when nothing wakes the loop earlier.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Scheduler for running a graph of dependent jobs with bounded parallelism.
pub struct Scheduler {
    id: SchedulerId,
    /// Maximum number of jobs running at once.
    max_concurrency: usize,
    /// Log job starts at `info` instead of `debug`.
    verbose: bool,
    /// Event bus for emitting events.
    event_bus: Arc<EventBus>,
}

impl Scheduler {
    /// Create a scheduler that runs at most `max_concurrency` jobs at once.
    pub fn new(max_concurrency: usize) -> Result<Self, SchedulerError> {
        if max_concurrency == 0 {
            return Err(SchedulerError::InvalidConcurrency);
        }

        Ok(Self {
            id: SchedulerId::new(),
            max_concurrency,
            verbose: true,
            event_bus: Arc::new(EventBus::new()),
        })
    }

    /// Set whether job starts are logged at `info` (default) or `debug`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the event bus.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Arc::new(event_bus);
        self
    }

    /// Get the scheduler's identifier.
    pub fn id(&self) -> SchedulerId {
        self.id
    }

    /// Get the concurrency cap.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Get the event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Start the control loop and return a handle for controlling it.
    ///
    /// Must be called from within a tokio runtime. The returned task resolves
    /// once `shutdown` has been answered, or once every handle is dropped and
    /// every job is closed.
    pub fn start(self) -> (SchedulerHandle, JoinHandle<Result<(), SchedulerError>>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_BUFFER);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let final_state = Arc::new(RwLock::new(None));
        let handle = SchedulerHandle {
            id: self.id,
            command_tx,
            final_state: Arc::clone(&final_state),
        };

        let span = tracing::info_span!("scheduler", scheduler_id = %self.id);
        let engine = Engine {
            table: JobTable::new(),
            running: 0,
            max_concurrency: self.max_concurrency,
            verbose: self.verbose,
            event_bus: self.event_bus,
            completion_tx,
            shutdown_waiters: Vec::new(),
            final_state,
        };

        let task = tokio::spawn(engine.run(command_rx, completion_rx).instrument(span));

        (handle, task)
    }
}

/// State owned by the control task.
struct Engine {
    table: JobTable,
    /// Jobs admitted and not yet closed.
    running: usize,
    max_concurrency: usize,
    verbose: bool,
    event_bus: Arc<EventBus>,
    completion_tx: mpsc::UnboundedSender<JobResult>,
    shutdown_waiters: Vec<oneshot::Sender<bool>>,
    final_state: Arc<RwLock<Option<FinalState>>>,
}

impl Engine {
    /// Main control loop.
    async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<SchedulerCommand>,
        completion_rx: mpsc::UnboundedReceiver<JobResult>,
    ) -> Result<(), SchedulerError> {
        tracing::debug!(cap = self.max_concurrency, "Scheduler started");

        let result = self.drive(&mut command_rx, completion_rx).await;

        // Must be published before the receiver drops: a request that loses
        // its channel falls back to this table.
        *self.final_state.write().await = Some(FinalState {
            successful: self.table.all_successful(),
            jobs: self.table.snapshots(),
        });
        drop(command_rx);

        if let Err(e) = &result {
            tracing::error!(error = %e, "Scheduler stopped on an internal error");
        }
        result
    }

    async fn drive(
        &mut self,
        command_rx: &mut mpsc::Receiver<SchedulerCommand>,
        mut completion_rx: mpsc::UnboundedReceiver<JobResult>,
    ) -> Result<(), SchedulerError> {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll().await?;
                }

                Some(result) = completion_rx.recv() => {
                    self.complete(result).await?;
                    self.poll().await?;
                }

                command = command_rx.recv(), if commands_open => {
                    match command {
                        Some(command) => self.handle_command(command).await?,
                        None => commands_open = false,
                    }
                }
            }

            if self.table.all_closed() {
                if !self.shutdown_waiters.is_empty() {
                    let successful = self.table.all_successful();
                    tracing::info!(
                        jobs = self.table.len(),
                        successful,
                        "All jobs closed, scheduler stopping"
                    );
                    for waiter in self.shutdown_waiters.drain(..) {
                        let _ = waiter.send(successful);
                    }
                    return Ok(());
                }

                if !commands_open {
                    tracing::debug!("All handles dropped and all jobs closed");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_command(&mut self, command: SchedulerCommand) -> Result<(), SchedulerError> {
        match command {
            SchedulerCommand::Add {
                job,
                after,
                response,
            } => {
                let result = self.add(job, after).await;
                let _ = response.send(result);
            }
            SchedulerCommand::AddDependency {
                job,
                dependency,
                response,
            } => {
                let result = self.add_dependency(job, dependency);
                let _ = response.send(result);
            }
            SchedulerCommand::Notify => {
                self.poll().await?;
            }
            SchedulerCommand::Status { job, response } => {
                let result = self
                    .table
                    .get(job)
                    .map(|record| record.snapshot())
                    .ok_or(SchedulerError::UnknownJob(job));
                let _ = response.send(result);
            }
            SchedulerCommand::Jobs { response } => {
                let _ = response.send(self.table.snapshots());
            }
            SchedulerCommand::RunningCount { response } => {
                let _ = response.send(self.running);
            }
            SchedulerCommand::Shutdown { response } => {
                tracing::info!(
                    open = self.table.len() - self.table.count_in(JobState::Closed),
                    "Shutdown requested, waiting for open jobs"
                );
                self.shutdown_waiters.push(response);
            }
        }
        Ok(())
    }

    async fn add(
        &mut self,
        job: Arc<dyn Job>,
        after: Vec<JobId>,
    ) -> Result<JobId, SchedulerError> {
        if let Some(unknown) = after.iter().find(|dep| !self.table.contains(**dep)) {
            return Err(SchedulerError::UnknownJob(*unknown));
        }

        let name = job.name().to_string();
        let id = self.table.insert(job);
        for dependency in after {
            self.table.add_dependency(id, dependency);
        }

        tracing::debug!(job_id = %id, job = %name, "Job added");
        self.event_bus.emit(Event::job_added(id, name)).await;
        Ok(id)
    }

    fn add_dependency(&mut self, job: JobId, dependency: JobId) -> Result<(), SchedulerError> {
        for id in [job, dependency] {
            if !self.table.contains(id) {
                return Err(SchedulerError::UnknownJob(id));
            }
        }
        self.table.add_dependency(job, dependency);
        tracing::debug!(job_id = %job, dependency = %dependency, "Dependency added");
        Ok(())
    }

    /// Record a worker's outcome: `Running -> Finished`.
    async fn complete(&mut self, result: JobResult) -> Result<(), SchedulerError> {
        let record = self
            .table
            .get_mut(result.job_id)
            .ok_or(SchedulerError::UnknownJob(result.job_id))?;
        record.finish(result.success)?;
        let name = record.name().to_string();

        self.event_bus
            .emit(Event::job_finished(
                result.job_id,
                name,
                result.success,
                result.duration,
            ))
            .await;
        Ok(())
    }

    /// One poll pass: closure pass, then admission pass.
    async fn poll(&mut self) -> Result<(), SchedulerError> {
        self.close_jobs().await?;
        self.admit_jobs().await
    }

    async fn close_jobs(&mut self) -> Result<(), SchedulerError> {
        for id in self.table.ids() {
            let state = self
                .table
                .get(id)
                .map(|record| record.state())
                .ok_or(SchedulerError::UnknownJob(id))?;

            let executed = match state {
                JobState::Finished => true,
                JobState::Idle if self.table.can_never_start(id) => false,
                _ => continue,
            };

            let record = self
                .table
                .get_mut(id)
                .ok_or(SchedulerError::UnknownJob(id))?;
            if executed {
                record.close()?;
                self.running -= 1;
            } else {
                record.abandon()?;
            }

            let name = record.name().to_string();
            let successful = record.successful().unwrap_or(false);

            if executed {
                tracing::debug!(job_id = %id, job = %name, successful, running = self.running, "Job closed");
            } else {
                tracing::warn!(job_id = %id, job = %name, "Dependency failed, job will not run");
            }

            self.event_bus
                .emit(Event::job_closed(id, name, successful, executed))
                .await;
        }
        Ok(())
    }

    async fn admit_jobs(&mut self) -> Result<(), SchedulerError> {
        for id in self.table.ids() {
            // Admission stops at the first slot blocked by the cap.
            if self.running >= self.max_concurrency {
                break;
            }
            if !self.table.should_start(id) {
                continue;
            }

            let record = self
                .table
                .get_mut(id)
                .ok_or(SchedulerError::UnknownJob(id))?;
            record.start()?;
            self.running += 1;

            let job = Arc::clone(record.job());
            let name = record.name().to_string();

            if self.verbose {
                tracing::info!(job_id = %id, job = %name, running = self.running, cap = self.max_concurrency, "Starting job");
            } else {
                tracing::debug!(job_id = %id, job = %name, running = self.running, cap = self.max_concurrency, "Starting job");
            }

            worker::spawn(id, job, self.completion_tx.clone());
            self.event_bus.emit(Event::job_started(id, name)).await;
        }
        Ok(())
    }
}
