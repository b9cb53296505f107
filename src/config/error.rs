//! Configuration error types.
//!
//! This module defines error types for pipeline loading and validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::scheduler::SchedulerError;

/// Errors that can occur when loading or registering a pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a specific file with context.
    #[error("failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML.
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Failed to parse YAML from a specific file.
    #[error("YAML parse error in '{path}': {source}")]
    YamlFileError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing required field.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Two jobs share an id.
    #[error("duplicate job id: {0}")]
    DuplicateId(String),

    /// An `after` entry does not name a job declared earlier in the file.
    #[error("job '{job}' runs after '{dependency}', which is not declared before it")]
    UnknownDependency { job: String, dependency: String },

    /// Registering the pipeline with a scheduler failed.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}
