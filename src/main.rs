//! jp - run a pipeline of dependent jobs.
//!
//! Usage:
//!   jp run <FILE>        Run every job in the pipeline file and wait for them
//!   jp validate <FILE>   Validate a pipeline file without running it
//!   jp list <FILE>       List the jobs in a pipeline file

use clap::{Parser, Subcommand};
use jobpool::{
    Event, EventHandler, JobKindConfig, PipelineBuilder, PipelineConfig, PipelineLoader,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// jp - run a pipeline of dependent jobs with bounded parallelism
#[derive(Parser)]
#[command(name = "jp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every job in a pipeline file
    Run {
        /// Path to the pipeline YAML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Maximum concurrent jobs (default: from the file, else the CPU count)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        /// Log job starts at debug level only
        #[arg(short, long)]
        quiet: bool,
    },

    /// Validate a pipeline file without running it
    Validate {
        /// Path to the pipeline YAML file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List the jobs in a pipeline file
    List {
        /// Path to the pipeline YAML file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Logs job outcomes as the scheduler reports them.
struct LoggingHandler;

#[async_trait::async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &Event) {
        match event {
            Event::JobFinished {
                name,
                successful,
                duration,
                ..
            } => {
                if *successful {
                    info!("Job '{}' succeeded in {:?}", name, duration);
                } else {
                    error!("Job '{}' failed after {:?}", name, duration);
                }
            }
            Event::JobClosed {
                name,
                executed: false,
                ..
            } => {
                warn!("Job '{}' skipped: a dependency failed", name);
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, jobs, quiet } => run_pipeline(file, jobs, quiet).await,
        Commands::Validate { file } => validate_pipeline(file),
        Commands::List { file } => list_pipeline(file),
    }
}

/// Run every job in a pipeline file.
async fn run_pipeline(
    file: PathBuf,
    jobs: Option<usize>,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    info!("Loading pipeline from: {}", file.display());

    let mut config: PipelineConfig = PipelineLoader::load(&file)?;
    if let Some(max) = jobs {
        config.max_concurrency = Some(max);
    }
    if quiet {
        config.verbose = false;
    }

    if config.jobs.is_empty() {
        warn!("No jobs defined in {}", file.display());
        return Ok(ExitCode::SUCCESS);
    }

    let scheduler = PipelineBuilder::scheduler(&config)?;
    scheduler.event_bus().register(Arc::new(LoggingHandler)).await;
    info!(
        "Running {} job(s) with at most {} at a time",
        config.jobs.len(),
        scheduler.max_concurrency()
    );

    let (handle, scheduler_task) = scheduler.start();
    PipelineBuilder::register(&config, &handle).await?;
    handle.notify().await?;

    // Cancellation is not supported: interrupting only stops waiting.
    let all_succeeded = tokio::select! {
        result = handle.shutdown() => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted while jobs were still running");
            return Ok(ExitCode::from(130));
        }
    };

    scheduler_task.await??;

    if all_succeeded {
        info!("All jobs succeeded");
        Ok(ExitCode::SUCCESS)
    } else {
        for job in handle.jobs().await?.iter().filter(|job| job.failed()) {
            error!(job = %job.name, "Job did not succeed");
        }
        error!("At least one job failed");
        Ok(ExitCode::FAILURE)
    }
}

/// Validate a pipeline file without running it.
fn validate_pipeline(file: PathBuf) -> Result<ExitCode, Box<dyn std::error::Error>> {
    info!("Validating pipeline: {}", file.display());

    match PipelineLoader::load(&file) {
        Ok(config) => {
            info!("All {} job(s) are valid", config.jobs.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// List the jobs in a pipeline file.
fn list_pipeline(file: PathBuf) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = PipelineLoader::load(&file)?;

    if config.jobs.is_empty() {
        println!("No jobs found in {}", file.display());
        return Ok(ExitCode::SUCCESS);
    }

    println!("Jobs in {}:", file.display());
    println!("  Max concurrency: {}", config.concurrency());
    println!();

    for job in &config.jobs {
        println!("ID: {}", job.id);
        println!("  Type: {}", job.kind.kind_name());
        println!("  Runs: {}", job.kind.describe());
        if let JobKindConfig::Command {
            success_codes: Some(codes),
            ..
        } = &job.kind
        {
            println!("  Success codes: {:?}", codes);
        }
        if !job.after.is_empty() {
            println!("  After: {}", job.after.join(", "));
        }
        println!();
    }

    Ok(ExitCode::SUCCESS)
}
