//! Configuration loading and parsing.
//!
//! This module provides YAML pipeline files: a scheduler setting block plus a
//! list of jobs with their `after` edges.

mod builder;
mod error;
mod types;
mod yaml;

pub use builder::PipelineBuilder;
pub use error::ConfigError;
pub use types::{JobConfig, JobKindConfig, PipelineConfig};
pub use yaml::PipelineLoader;
