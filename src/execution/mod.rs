//! Job execution.
//!
//! This module provides the concrete job kinds that ship with the crate and
//! the worker that runs a single job off the scheduler's control loop.

mod command;
mod function;
mod remove;
pub(crate) mod worker;

pub use command::{CommandJob, CommandJobBuilder};
pub use function::FnJob;
pub use remove::RemoveFileJob;
pub use worker::JobResult;
