//! Error types for task injection.

use thiserror::Error;

/// Errors that prevent a task from being set up at all.
///
/// Per-participant faults (missing capabilities, lookup misses, memory
/// store failures) never show up here; they are recorded in the
/// [`InjectionReport`](crate::InjectionReport) instead.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The participant list was empty
    #[error("Task '{0}' needs at least one participant")]
    NoParticipants(&'static str),
    
    /// A partitioned task needs more registered participants than it got
    #[error("Task '{task}' needs at least {required} participants, found {found}")]
    InsufficientParticipants {
        task: &'static str,
        required: usize,
        found: usize,
    },
    
    /// A task parameter could not be parsed
    #[error("Invalid task parameter: {0}")]
    InvalidParameter(String),
}

impl TaskError {
    /// Creates an invalid-parameter error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}
