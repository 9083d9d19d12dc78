//! Remote service port: the network task API.

use crate::task::domain::{Priority, Task, TaskDomainError, TaskId, TaskStatus, TaskTitle};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::TaskRecord;

/// Result type for remote service operations.
pub type RemoteServiceResult<T> = Result<T, RemoteServiceError>;

/// Wire form of a task.
///
/// Serialised as camelCase JSON with epoch-millisecond timestamps. The
/// local display date is not part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    /// Server-side identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Description, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Priority.
    pub priority: Priority,
    /// Status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Server-assigned creation timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Server-assigned update timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl RemoteTask {
    /// Converts the wire form into the local storage form.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the server sent a blank
    /// title.
    pub fn into_record(self, added_date: NaiveDate) -> Result<TaskRecord, TaskDomainError> {
        let title = TaskTitle::new(self.title)?;
        Ok(TaskRecord {
            id: self.id,
            title: title.into(),
            description: self.description,
            priority: self.priority,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            added_date,
        })
    }
}

impl From<&Task> for RemoteTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().as_str().to_owned(),
            description: task.description().to_owned(),
            priority: task.priority(),
            status: task.status(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Network task API contract. Every call may fail or be slow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteTaskService: Send + Sync {
    /// Fetches the complete task list.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError`] on any network or server failure.
    async fn list_all(&self) -> RemoteServiceResult<Vec<RemoteTask>>;

    /// Creates a task and returns the stored copy with its server id.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError`] on any network or server failure.
    async fn create(&self, task: &RemoteTask) -> RemoteServiceResult<RemoteTask>;

    /// Replaces the task stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::NotFound`] for an unknown id, or another
    /// variant on network or server failure.
    async fn update(&self, id: TaskId, task: &RemoteTask) -> RemoteServiceResult<RemoteTask>;

    /// Deletes the task stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::NotFound`] for an unknown id, or another
    /// variant on network or server failure.
    async fn delete(&self, id: TaskId) -> RemoteServiceResult<()>;
}

/// Errors returned by remote service implementations.
#[derive(Debug, Clone, Error)]
pub enum RemoteServiceError {
    /// The service could not be reached.
    #[error("remote service unavailable: {0}")]
    Unavailable(String),

    /// The service has no task with this identifier.
    #[error("remote task not found: {0}")]
    NotFound(TaskId),

    /// Transport or decoding failure.
    #[error("remote transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl RemoteServiceError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
