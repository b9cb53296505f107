//! YAML pipeline parsing.
//!
//! Parses pipeline files and validates them before any job is registered.

use std::collections::HashSet;
use std::path::Path;

use super::error::ConfigError;
use super::types::{JobConfig, JobKindConfig, PipelineConfig};

/// YAML pipeline loader.
pub struct PipelineLoader;

impl PipelineLoader {
    /// Load and validate a pipeline from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: PipelineConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Parse and validate a pipeline from a YAML string.
    pub fn parse(yaml: &str) -> Result<PipelineConfig, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate a pipeline.
    ///
    /// `after` may only name jobs declared earlier in the file, which keeps
    /// every file-defined pipeline acyclic.
    pub fn validate(config: &PipelineConfig) -> Result<(), ConfigError> {
        if config.max_concurrency == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "max_concurrency cannot be zero".into(),
            ));
        }

        let mut declared: HashSet<&str> = HashSet::new();
        for job in &config.jobs {
            Self::validate_job(job)?;

            let mut seen_deps = HashSet::new();
            for dep in &job.after {
                if !declared.contains(dep.as_str()) {
                    return Err(ConfigError::UnknownDependency {
                        job: job.id.clone(),
                        dependency: dep.clone(),
                    });
                }
                if !seen_deps.insert(dep) {
                    return Err(ConfigError::InvalidConfig(format!(
                        "job '{}' has duplicate dependency '{}'",
                        job.id, dep
                    )));
                }
            }

            if !declared.insert(&job.id) {
                return Err(ConfigError::DuplicateId(job.id.clone()));
            }
        }

        Ok(())
    }

    fn validate_job(job: &JobConfig) -> Result<(), ConfigError> {
        if job.id.trim().is_empty() {
            return Err(ConfigError::MissingField("id".into()));
        }

        match &job.kind {
            JobKindConfig::Command {
                command,
                success_codes,
                ..
            } => {
                if command.trim().is_empty() {
                    return Err(ConfigError::MissingField(format!("{}.command", job.id)));
                }
                if success_codes.as_ref().is_some_and(|codes| codes.is_empty()) {
                    return Err(ConfigError::InvalidConfig(format!(
                        "job '{}' has an empty success_codes list",
                        job.id
                    )));
                }
            }
            JobKindConfig::RemoveFile { path } => {
                if path.trim().is_empty() {
                    return Err(ConfigError::MissingField(format!("{}.path", job.id)));
                }
            }
        }

        Ok(())
    }
}
