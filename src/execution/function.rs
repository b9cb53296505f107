//! Closure-backed job.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;

use crate::core::job::{Job, JobError};

/// A job that runs an async closure.
///
/// The closure is called once per execution and must produce a fresh future
/// each time.
///
/// ```rust
/// use jobpool::{FnJob, JobError};
///
/// let job = FnJob::new("checksum", || async {
///     // ...
///     Ok::<(), JobError>(())
/// });
/// ```
pub struct FnJob<F> {
    name: String,
    f: F,
}

impl<F, Fut> FnJob<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), JobError>> + Send,
{
    /// Create a job named `name` that runs `f`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnJob<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnJob").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> Job for FnJob<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), JobError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<(), JobError> {
        (self.f)().await
    }
}
