//! Job trait and error types.
//!
//! The `Job` trait is the unit of work the scheduler runs. Implement it to
//! plug any kind of work into the same scheduler.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors a job can report from [`Job::execute`].
///
/// A job error never escapes the scheduler: it is recorded as an
/// unsuccessful outcome for the job and logged.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed with a message.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// External command exited with a code outside its allow-list.
    #[error("command exited with code {code}")]
    CommandFailed { code: i32 },

    /// External command was terminated without an exit code (e.g. by a signal).
    #[error("command terminated without an exit code")]
    CommandTerminated,

    /// External command could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be removed.
    #[error("failed to remove '{path}': {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The job panicked while executing.
    #[error("job panicked: {0}")]
    Panicked(String),

    /// Generic error wrapper.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The core trait for defining schedulable jobs.
///
/// `execute` runs on its own tokio task and may take as long as it needs.
/// Its result becomes the job's outcome: `Ok(())` marks the job successful,
/// any error marks it failed. The outcome is recorded exactly once by the
/// scheduler, so implementations never manage job state themselves.
///
/// # Example
///
/// ```ignore
/// use jobpool::{Job, JobError};
/// use async_trait::async_trait;
///
/// struct Touch {
///     path: String,
/// }
///
/// #[async_trait]
/// impl Job for Touch {
///     fn name(&self) -> &str {
///         &self.path
///     }
///
///     async fn execute(&self) -> Result<(), JobError> {
///         tokio::fs::write(&self.path, b"")
///             .await
///             .map_err(|e| JobError::ExecutionFailed(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync {
    /// Human-readable label used in logs and events.
    fn name(&self) -> &str;

    /// Run the job to completion.
    async fn execute(&self) -> Result<(), JobError>;
}
