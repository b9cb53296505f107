//! Lifecycle events and event handling.
//!
//! The scheduler emits an event whenever a job is added, started, finished or
//! closed. Handlers run inline on the scheduler's control loop, so they must
//! be quick and must not wait on the scheduler themselves.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::types::JobId;

/// Lifecycle events emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum Event {
    /// A job was registered.
    JobAdded {
        job_id: JobId,
        name: String,
        timestamp: Instant,
    },

    /// A job was admitted and its worker spawned.
    JobStarted {
        job_id: JobId,
        name: String,
        timestamp: Instant,
    },

    /// A job's worker returned.
    JobFinished {
        job_id: JobId,
        name: String,
        successful: bool,
        duration: Duration,
        timestamp: Instant,
    },

    /// A job reached its terminal state.
    ///
    /// `executed` is false when the job was closed because a dependency
    /// failed and it never ran.
    JobClosed {
        job_id: JobId,
        name: String,
        successful: bool,
        executed: bool,
        timestamp: Instant,
    },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::JobAdded { timestamp, .. } => *timestamp,
            Event::JobStarted { timestamp, .. } => *timestamp,
            Event::JobFinished { timestamp, .. } => *timestamp,
            Event::JobClosed { timestamp, .. } => *timestamp,
        }
    }

    /// Get the id of the job the event is about.
    pub fn job_id(&self) -> JobId {
        match self {
            Event::JobAdded { job_id, .. } => *job_id,
            Event::JobStarted { job_id, .. } => *job_id,
            Event::JobFinished { job_id, .. } => *job_id,
            Event::JobClosed { job_id, .. } => *job_id,
        }
    }

    /// Create a JobAdded event.
    pub fn job_added(job_id: JobId, name: impl Into<String>) -> Self {
        Event::JobAdded {
            job_id,
            name: name.into(),
            timestamp: Instant::now(),
        }
    }

    /// Create a JobStarted event.
    pub fn job_started(job_id: JobId, name: impl Into<String>) -> Self {
        Event::JobStarted {
            job_id,
            name: name.into(),
            timestamp: Instant::now(),
        }
    }

    /// Create a JobFinished event.
    pub fn job_finished(
        job_id: JobId,
        name: impl Into<String>,
        successful: bool,
        duration: Duration,
    ) -> Self {
        Event::JobFinished {
            job_id,
            name: name.into(),
            successful,
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a JobClosed event.
    pub fn job_closed(
        job_id: JobId,
        name: impl Into<String>,
        successful: bool,
        executed: bool,
    ) -> Self {
        Event::JobClosed {
            job_id,
            name: name.into(),
            successful,
            executed,
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
