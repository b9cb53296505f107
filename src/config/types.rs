//! Configuration type definitions.
//!
//! This module contains the type definitions for YAML pipeline files: the
//! scheduler settings and the list of jobs with their `after` edges.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// A pipeline file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Concurrency cap. Defaults to the number of available CPUs.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    /// Log job starts at `info` instead of `debug`.
    #[serde(default = "default_true")]
    pub verbose: bool,
    /// Job definitions, in registration order.
    pub jobs: Vec<JobConfig>,
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    /// The configured cap, or the number of available CPUs.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Find a job definition by id.
    pub fn job(&self, id: &str) -> Option<&JobConfig> {
        self.jobs.iter().find(|job| job.id == id)
    }
}

/// Job configuration from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job identifier, unique within the file.
    pub id: String,
    /// Job kind and its settings.
    #[serde(flatten)]
    pub kind: JobKindConfig,
    /// Ids of jobs declared earlier in the file that must succeed first.
    #[serde(default)]
    pub after: Vec<String>,
}

/// Job kind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobKindConfig {
    /// External command.
    Command {
        /// The program to run.
        command: String,
        /// Command arguments.
        #[serde(default)]
        args: Vec<String>,
        /// Exit codes that count as success. Defaults to `[0]`.
        #[serde(default)]
        success_codes: Option<Vec<i32>>,
        /// Extra environment variables.
        #[serde(default)]
        environment: HashMap<String, String>,
        /// Working directory.
        #[serde(default)]
        working_dir: Option<String>,
    },
    /// File deletion.
    RemoveFile {
        /// The path to delete.
        path: String,
    },
}

impl JobKindConfig {
    /// Short label for listings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            JobKindConfig::Command { .. } => "command",
            JobKindConfig::RemoveFile { .. } => "remove_file",
        }
    }

    /// Human-readable summary of what the job does.
    pub fn describe(&self) -> String {
        match self {
            JobKindConfig::Command { command, args, .. } => {
                let mut parts = vec![command.as_str()];
                parts.extend(args.iter().map(String::as_str));
                parts.join(" ")
            }
            JobKindConfig::RemoveFile { path } => format!("rm {}", path),
        }
    }
}
