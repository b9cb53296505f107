//! File removal job.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::core::job::{Job, JobError};

/// A job that deletes a single file.
///
/// The job succeeds unless the deletion fails; a missing file is a failure.
#[derive(Debug, Clone)]
pub struct RemoveFileJob {
    name: String,
    path: PathBuf,
}

impl RemoveFileJob {
    /// Create a job that removes `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("rm {}", path.display()),
            path,
        }
    }

    /// Override the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the path to remove.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Job for RemoveFileJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<(), JobError> {
        tokio::fs::remove_file(&self.path).await.map_err(|source| {
            tracing::warn!(path = %self.path.display(), error = %source, "unlink failed");
            JobError::RemoveFailed {
                path: self.path.clone(),
                source,
            }
        })
    }
}
