//! Pipeline builder from YAML configuration.
//!
//! This module converts a `PipelineConfig` into a configured `Scheduler` and
//! registers its jobs, wiring `after` edges in file order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::job::Job;
use crate::execution::{CommandJob, RemoveFileJob};
use crate::scheduler::{JobHandle, Scheduler, SchedulerHandle};

use super::error::ConfigError;
use super::types::{JobConfig, JobKindConfig, PipelineConfig};
use super::yaml::PipelineLoader;

/// Builder for turning pipeline configuration into scheduled jobs.
pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Create a scheduler configured with the pipeline's cap and verbosity.
    pub fn scheduler(config: &PipelineConfig) -> Result<Scheduler, ConfigError> {
        Ok(Scheduler::new(config.concurrency())?.with_verbose(config.verbose))
    }

    /// Add every job of the pipeline to `scheduler`.
    ///
    /// Returns the handle of each job keyed by its id.
    pub async fn register(
        config: &PipelineConfig,
        scheduler: &SchedulerHandle,
    ) -> Result<HashMap<String, JobHandle>, ConfigError> {
        PipelineLoader::validate(config)?;

        let mut handles: HashMap<String, JobHandle> = HashMap::with_capacity(config.jobs.len());
        for job_config in &config.jobs {
            let after = job_config
                .after
                .iter()
                .map(|dep| {
                    handles
                        .get(dep)
                        .cloned()
                        .ok_or_else(|| ConfigError::UnknownDependency {
                            job: job_config.id.clone(),
                            dependency: dep.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let handle = scheduler
                .add_shared(Self::build_job(job_config), &after)
                .await?;
            tracing::debug!(job = %job_config.id, job_id = %handle.id(), "Registered pipeline job");
            handles.insert(job_config.id.clone(), handle);
        }

        Ok(handles)
    }

    /// Build a job from its configuration. The job is named after its id.
    pub fn build_job(config: &JobConfig) -> Arc<dyn Job> {
        match &config.kind {
            JobKindConfig::Command {
                command,
                args,
                success_codes,
                environment,
                working_dir,
            } => {
                let mut builder = CommandJob::builder(command)
                    .name(&config.id)
                    .args(args)
                    .envs(environment);

                if let Some(codes) = success_codes {
                    builder = builder.success_codes(codes.iter().copied());
                }

                if let Some(dir) = working_dir {
                    builder = builder.working_dir(dir);
                }

                Arc::new(builder.build())
            }
            JobKindConfig::RemoveFile { path } => {
                Arc::new(RemoveFileJob::new(path).with_name(&config.id))
            }
        }
    }
}
