//! Job workers.
//!
//! A worker runs exactly one job's `execute()` on its own tokio task and then
//! reports the result to the scheduler that spawned it. It never touches the
//! scheduler's job table; sending the result is what wakes the poll loop.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use crate::core::job::{Job, JobError};
use crate::core::types::JobId;

/// Result of executing a job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// The job that was executed.
    pub job_id: JobId,
    /// Whether the job succeeded.
    pub success: bool,
    /// Wall-clock duration of `execute()`.
    pub duration: Duration,
    /// Error if the job failed.
    pub error: Option<String>,
}

impl JobResult {
    /// Create a successful result.
    pub fn success(job_id: JobId, duration: Duration) -> Self {
        Self {
            job_id,
            success: true,
            duration,
            error: None,
        }
    }

    /// Create a failed result.
    pub fn failure(job_id: JobId, duration: Duration, error: String) -> Self {
        Self {
            job_id,
            success: false,
            duration,
            error: Some(error),
        }
    }
}

/// Spawn a worker for `job` that reports to `completions` when done.
///
/// A panic inside the job is caught and reported as a failure so the job
/// still reaches `Finished`.
pub(crate) fn spawn(
    job_id: JobId,
    job: Arc<dyn Job>,
    completions: mpsc::UnboundedSender<JobResult>,
) -> JoinHandle<()> {
    let span = info_span!("job_worker", job_id = %job_id, job = %job.name());

    tokio::spawn(
        async move {
            let result = run(job_id, job).await;
            if completions.send(result).is_err() {
                debug!("scheduler stopped before the job result was delivered");
            }
        }
        .instrument(span),
    )
}

async fn run(job_id: JobId, job: Arc<dyn Job>) -> JobResult {
    let start = Instant::now();

    // The job runs on a nested task so a panic surfaces as a JoinError here.
    let execution = tokio::spawn(async move { job.execute().await });

    let outcome = match execution.await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(JobError::Panicked(join_error.to_string())),
    };
    let duration = start.elapsed();

    match outcome {
        Ok(()) => {
            debug!(duration_ms = %duration.as_millis(), "job succeeded");
            JobResult::success(job_id, duration)
        }
        Err(err) => {
            warn!(duration_ms = %duration.as_millis(), error = %err, "job failed");
            JobResult::failure(job_id, duration, err.to_string())
        }
    }
}
