//! External command job.
//!
//! [`CommandJob`] runs an external program, waits for it to exit and maps an
//! allow-list of exit codes to success. The child inherits the parent's
//! standard streams.
//!
//! # Quick Start
//!
//! ```rust
//! use jobpool::CommandJob;
//!
//! // Succeeds on exit code 0
//! let job = CommandJob::builder("convert")
//!     .args(["canvas.png", "canvas.jpg"])
//!     .build();
//!
//! // `grep` exits with 1 when nothing matched, which is fine here
//! let search = CommandJob::builder("grep")
//!     .args(["-q", "TODO", "notes.txt"])
//!     .success_codes([0, 1])
//!     .build();
//! assert!(search.is_success_code(1));
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;

use crate::core::job::{Job, JobError};

/// A job that executes an external command.
#[derive(Debug, Clone)]
pub struct CommandJob {
    /// Display name (defaults to the command line)
    name: String,
    /// Program to execute
    program: String,
    /// Command arguments
    args: Vec<String>,
    /// Extra environment variables
    environment: BTreeMap<String, String>,
    /// Working directory
    working_dir: Option<PathBuf>,
    /// Exit codes that count as success
    success_codes: Vec<i32>,
}

impl CommandJob {
    /// Create a new builder for a command job.
    pub fn builder(program: impl Into<String>) -> CommandJobBuilder {
        CommandJobBuilder::new(program)
    }

    /// Create a job from an argv-style command line.
    ///
    /// Returns `None` when `argv` is empty.
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next()?;
        Some(CommandJobBuilder::new(program).args(argv).build())
    }

    /// Get the program being executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the command arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory.
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Get the exit codes treated as success.
    pub fn success_codes(&self) -> &[i32] {
        &self.success_codes
    }

    /// Check whether an exit code counts as success.
    pub fn is_success_code(&self, code: i32) -> bool {
        self.success_codes.contains(&code)
    }
}

#[async_trait]
impl Job for CommandJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<(), JobError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.environment {
            cmd.env(key, value);
        }

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().await.map_err(|source| JobError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let Some(code) = status.code() else {
            return Err(JobError::CommandTerminated);
        };

        tracing::debug!(job = %self.name, code, "command exited");

        if self.is_success_code(code) {
            Ok(())
        } else {
            Err(JobError::CommandFailed { code })
        }
    }
}

/// Builder for creating `CommandJob` instances.
#[derive(Debug, Clone)]
pub struct CommandJobBuilder {
    name: Option<String>,
    program: String,
    args: Vec<String>,
    environment: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
    success_codes: Vec<i32>,
}

impl CommandJobBuilder {
    /// Create a new builder with the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            name: None,
            program: program.into(),
            args: Vec::new(),
            environment: BTreeMap::new(),
            working_dir: None,
            success_codes: vec![0],
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a single environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replace the exit codes treated as success (default: `[0]`).
    pub fn success_codes<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        self.success_codes = codes.into_iter().collect();
        self
    }

    /// Build the `CommandJob`.
    pub fn build(self) -> CommandJob {
        let name = self.name.unwrap_or_else(|| {
            std::iter::once(self.program.as_str())
                .chain(self.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        });
        CommandJob {
            name,
            program: self.program,
            args: self.args,
            environment: self.environment,
            working_dir: self.working_dir,
            success_codes: self.success_codes,
        }
    }
}
