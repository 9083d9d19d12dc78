//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The priority value is not one of the known priorities.
    #[error("unknown task priority: {0}")]
    UnknownPriority(String),

    /// The status value is not one of the known statuses.
    #[error("unknown task status: {0}")]
    UnknownStatus(String),
}
