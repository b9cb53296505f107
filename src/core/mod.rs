//! Core job model: identifiers, the `Job` trait, the state machine and the
//! job table the scheduler owns.

pub mod job;
pub mod state;
pub(crate) mod table;
pub mod types;
