//! Local-first task mutations with best-effort remote propagation.

use async_stream::stream;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::task::{
    domain::{Resource, ResourceStream, Task, TaskId},
    ports::{LocalStoreError, LocalTaskStore, RemoteTask, RemoteTaskService, TaskRecord},
};

/// Applies add/edit/remove to the local store, then mirrors them remotely.
///
/// The local write decides the outcome. A remote failure is logged and
/// never turns a successful local write into an error.
pub struct TaskMutationService<L, R, C>
where
    L: LocalTaskStore,
    R: RemoteTaskService,
    C: Clock + Send + Sync,
{
    local: Arc<L>,
    remote: Arc<R>,
    clock: Arc<C>,
}

impl<L, R, C> Clone for TaskMutationService<L, R, C>
where
    L: LocalTaskStore,
    R: RemoteTaskService,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            local: Arc::clone(&self.local),
            remote: Arc::clone(&self.remote),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<L, R, C> TaskMutationService<L, R, C>
where
    L: LocalTaskStore + 'static,
    R: RemoteTaskService + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new mutation service.
    #[must_use]
    pub const fn new(local: Arc<L>, remote: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            local,
            remote,
            clock,
        }
    }

    /// Adds a task.
    ///
    /// Emits `Loading(true)`, then `Success` with the final id (the
    /// server-assigned one when the remote created the task under a
    /// different id) or `Error`, then `Loading(false)`.
    #[must_use]
    pub fn add(&self, task: Task) -> ResourceStream<TaskId> {
        let service = self.clone();
        Box::pin(stream! {
            yield Resource::Loading(true);
            yield service.add_task(task).await;
            yield Resource::Loading(false);
        })
    }

    /// Edits a task, stamping `updated_at` from the clock.
    #[must_use]
    pub fn edit(&self, task: Task) -> ResourceStream<TaskId> {
        let service = self.clone();
        Box::pin(stream! {
            yield Resource::Loading(true);
            yield service.edit_task(task).await;
            yield Resource::Loading(false);
        })
    }

    /// Removes a task.
    #[must_use]
    pub fn remove(&self, task: Task) -> ResourceStream<TaskId> {
        let service = self.clone();
        Box::pin(stream! {
            yield Resource::Loading(true);
            yield service.remove_task(task.id()).await;
            yield Resource::Loading(false);
        })
    }

    #[tracing::instrument(skip(self, task), fields(title = %task.title()))]
    async fn add_task(&self, task: Task) -> Resource<TaskId> {
        let local_id = match self.local.insert(&TaskRecord::from(&task)).await {
            Ok(id) => id,
            Err(err) => {
                error!(error = %err, "failed to add task to local store");
                return Resource::Error(user_message(&err, "Failed to add task"));
            }
        };
        let provisional = task.with_id(local_id);
        debug!(task_id = %local_id, "task stored locally");

        let id = match self.remote.create(&RemoteTask::from(&provisional)).await {
            Ok(created) => self.reconcile_id(&provisional, created).await,
            Err(err) => {
                warn!(task_id = %local_id, error = %err, "failed to sync new task with server");
                local_id
            }
        };
        Resource::Success(id)
    }

    /// Moves a freshly created task to the id the server assigned.
    ///
    /// The new row is written before the provisional one is removed, so a
    /// failure part-way leaves the task reachable under one of the ids.
    async fn reconcile_id(&self, provisional: &Task, created: RemoteTask) -> TaskId {
        let local_id = provisional.id();
        let server_id = created.id;
        if server_id == local_id {
            return local_id;
        }

        let record = match created.into_record(provisional.added_date()) {
            Ok(record) => record,
            Err(err) => {
                warn!(task_id = %local_id, error = %err, "server returned an invalid task; keeping local id");
                return local_id;
            }
        };
        if let Err(err) = self.local.insert(&record).await {
            warn!(
                task_id = %local_id,
                server_id = %server_id,
                error = %err,
                "could not store task under server id; keeping local id"
            );
            return local_id;
        }
        if let Err(err) = self.local.delete(local_id).await {
            warn!(task_id = %local_id, error = %err, "failed to remove provisional task row");
        }
        info!(task_id = %local_id, server_id = %server_id, "task id reconciled with server");
        server_id
    }

    #[tracing::instrument(skip(self, task), fields(task_id = %task.id()))]
    async fn edit_task(&self, task: Task) -> Resource<TaskId> {
        let edited = task.touched(&*self.clock);
        let id = edited.id();
        match self.local.update(&TaskRecord::from(&edited)).await {
            Ok(0) => {
                warn!("edited task does not exist locally");
                return Resource::Error(format!("Task {id} no longer exists"));
            }
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "failed to update task in local store");
                return Resource::Error(user_message(&err, "Failed to update task"));
            }
        }

        if let Err(err) = self.remote.update(id, &RemoteTask::from(&edited)).await {
            warn!(error = %err, "failed to sync updated task with server");
        }
        Resource::Success(id)
    }

    #[tracing::instrument(skip(self))]
    async fn remove_task(&self, id: TaskId) -> Resource<TaskId> {
        if let Err(err) = self.local.delete(id).await {
            error!(error = %err, "failed to delete task from local store");
            return Resource::Error(user_message(&err, "Failed to delete task"));
        }

        if let Err(err) = self.remote.delete(id).await {
            warn!(error = %err, "failed to sync deleted task with server");
        }
        Resource::Success(id)
    }
}

/// Short message shown for a local store failure; storage details stay in
/// the logs.
fn user_message(err: &LocalStoreError, fallback: &str) -> String {
    match err {
        LocalStoreError::DuplicateTask(id) => format!("Task {id} already exists"),
        LocalStoreError::Persistence(_) => fallback.to_owned(),
    }
}
