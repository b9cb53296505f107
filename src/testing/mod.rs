//! Testing utilities for users of the jobpool library.
//!
//! This module provides helpers for testing scheduled pipelines:
//!
//! - [`TestJob`]: A job with a scripted outcome and an optional delay
//! - [`CallCounter`]: Observes how often a job was executed after it was moved
//!   into a scheduler
//! - [`ConcurrencyProbe`]: Records how many probed jobs ran at the same time

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::job::{Job, JobError};

/// How a [`TestJob`] ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeed,
    Fail,
    Panic,
}

/// A job with a scripted outcome.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use jobpool::testing::TestJob;
///
/// let job = TestJob::failing("flaky").with_delay(Duration::from_millis(10));
/// let calls = job.call_counter();
/// // Add `job` to a scheduler, then inspect `calls.count()`.
/// assert_eq!(calls.count(), 0);
/// ```
pub struct TestJob {
    name: String,
    outcome: Outcome,
    delay: Duration,
    calls: CallCounter,
    probe: Option<ConcurrencyProbe>,
}

impl TestJob {
    fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            delay: Duration::ZERO,
            calls: CallCounter::default(),
            probe: None,
        }
    }

    /// Create a job that succeeds.
    pub fn succeeding(name: impl Into<String>) -> Self {
        Self::new(name, Outcome::Succeed)
    }

    /// Create a job that fails with `JobError::ExecutionFailed`.
    pub fn failing(name: impl Into<String>) -> Self {
        Self::new(name, Outcome::Fail)
    }

    /// Create a job that panics while executing.
    pub fn panicking(name: impl Into<String>) -> Self {
        Self::new(name, Outcome::Panic)
    }

    /// Sleep for `delay` before producing the outcome.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Report entry and exit to `probe`.
    pub fn with_probe(mut self, probe: &ConcurrencyProbe) -> Self {
        self.probe = Some(probe.clone());
        self
    }

    /// Get a counter that stays valid after the job is moved.
    pub fn call_counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl Job for TestJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<(), JobError> {
        self.calls.increment();
        let _guard = self.probe.as_ref().map(|probe| probe.enter(&self.name));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(JobError::ExecutionFailed(format!(
                "{} failed on purpose",
                self.name
            ))),
            Outcome::Panic => panic!("{} panicked on purpose", self.name),
        }
    }
}

/// Shared execution counter.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    /// Get the number of recorded executions.
    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tracks concurrently executing jobs.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    inner: Arc<ProbeState>,
}

#[derive(Debug, Default)]
struct ProbeState {
    current: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<String>>,
}

impl ConcurrencyProbe {
    /// Create a probe with no recorded activity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of probed jobs executing right now.
    pub fn current(&self) -> usize {
        self.inner.current.load(Ordering::SeqCst)
    }

    /// Highest number of probed jobs that executed at the same time.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Names of probed jobs in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.inner
            .started
            .lock()
            .map(|started| started.clone())
            .unwrap_or_default()
    }

    fn enter(&self, name: &str) -> ProbeGuard {
        let now = self.inner.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        if let Ok(mut started) = self.inner.started.lock() {
            started.push(name.to_string());
        }
        ProbeGuard {
            probe: self.clone(),
        }
    }
}

/// Decrements the probe's current count when dropped, including on panic.
struct ProbeGuard {
    probe: ConcurrencyProbe,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.probe.inner.current.fetch_sub(1, Ordering::SeqCst);
    }
}
