//! Local store port: the persistent, observable collection of tasks.

use crate::task::domain::{
    PersistedTaskData, Priority, Task, TaskDomainError, TaskId, TaskStatus, TaskTitle,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// Result type for local store operations.
pub type LocalStoreResult<T> = Result<T, LocalStoreError>;

/// Live stream of the full task collection, ordered by id ascending.
pub type TaskRecordStream = BoxStream<'static, LocalStoreResult<Vec<TaskRecord>>>;

/// Storage form of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Row identifier; `0` asks the store to assign one.
    pub id: TaskId,
    /// Title as stored.
    pub title: String,
    /// Description, possibly empty.
    pub description: String,
    /// Priority.
    pub priority: Priority,
    /// Status.
    pub status: TaskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Local display date.
    pub added_date: NaiveDate,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().as_str().to_owned(),
            description: task.description().to_owned(),
            priority: task.priority(),
            status: task.status(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
            added_date: task.added_date(),
        }
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskDomainError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        Ok(Self::from_persisted(PersistedTaskData {
            id: record.id,
            title: TaskTitle::new(record.title)?,
            description: record.description,
            priority: record.priority,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            added_date: record.added_date,
        }))
    }
}

/// Persistence contract for the local task collection.
///
/// Implementations serialise their own writes; every completed write is
/// visible to later reads and to open [`observe_all`](Self::observe_all)
/// streams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocalTaskStore: Send + Sync {
    /// Inserts a task and returns its identifier.
    ///
    /// A record with id `0` receives a store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::DuplicateTask`] when the id is taken.
    async fn insert(&self, record: &TaskRecord) -> LocalStoreResult<TaskId>;

    /// Inserts every record whose id is free, leaving existing rows as
    /// they are. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::Persistence`] when the batch cannot be
    /// written; no row of the batch is written in that case.
    async fn insert_batch_ignoring_conflicts(
        &self,
        records: &[TaskRecord],
    ) -> LocalStoreResult<usize>;

    /// Replaces the row with the record's id and returns the rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::Persistence`] on storage failure.
    async fn update(&self, record: &TaskRecord) -> LocalStoreResult<u64>;

    /// Deletes the row with the given id. Deleting a missing row is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::Persistence`] on storage failure.
    async fn delete(&self, id: TaskId) -> LocalStoreResult<()>;

    /// Deletes every row.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::Persistence`] on storage failure.
    async fn delete_all(&self) -> LocalStoreResult<()>;

    /// Opens a live stream of the whole collection.
    ///
    /// The stream yields the current rows immediately and again after every
    /// change, delivering at least the latest state.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::Persistence`] when the subscription cannot
    /// be opened.
    fn observe_all(&self) -> LocalStoreResult<TaskRecordStream>;
}

/// Errors returned by local store implementations.
#[derive(Debug, Clone, Error)]
pub enum LocalStoreError {
    /// A row with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl LocalStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
