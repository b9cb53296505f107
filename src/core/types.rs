//! Core identifier types for the job server.
//!
//! Jobs are addressed by their insertion index inside the scheduler that owns
//! them; schedulers carry a random identifier so handles from different
//! schedulers can never be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a job within its owning scheduler.
///
/// The value is the job's position in the scheduler's insertion order, which
/// is also the order used by every poll pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(usize);

/// Unique identifier for a scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchedulerId(Uuid);

impl JobId {
    /// Create a JobId from an insertion index.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the insertion index of the job.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl SchedulerId {
    /// Generate a new random SchedulerId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SchedulerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for SchedulerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
